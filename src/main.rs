use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use sheet_sql_ingest::config::IngestConfig;
use sheet_sql_ingest::ingestion::TracingObserver;
use sheet_sql_ingest::pipeline::{IngestionReport, Ingestor, StatusMessage};
use sheet_sql_ingest::IngestionResult;

#[derive(Debug, Parser)]
#[command(name = "sheet-sql-ingest", version, about = "Load CSV files and workbooks into SQL tables")]
struct Cli {
    /// JSON configuration file; the environment (and `.env`) is used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a file from the remote folder and replace `{prefix}__{sheet}` tables.
    Ingest {
        /// File name in the remote folder.
        file: String,
        /// Table-name prefix; defaults to the configured prefix.
        #[arg(long)]
        prefix: Option<String>,
        /// Print `{"status": ...}` instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Load local files, skipping tables that already exist.
    Load {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Load every supported file under a directory.
    LoadDir { dir: PathBuf },
    /// Download remote files not yet present locally.
    Download {
        /// Destination directory; defaults to the configured download directory.
        #[arg(long)]
        dest: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "ingestion failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> IngestionResult<ExitCode> {
    let config = match &cli.config {
        Some(path) => IngestConfig::from_json_path(path)?,
        None => IngestConfig::from_env()?,
    };
    let ingestor = Ingestor::from_config(config)?.with_observer(Arc::new(TracingObserver));

    match cli.command {
        Command::Ingest { file, prefix, json } => {
            let prefix = prefix.unwrap_or_else(|| ingestor.config().default_prefix.clone());
            let result = ingestor.ingest(&file, &prefix);
            if json {
                let status = match &result {
                    Ok(report) => StatusMessage::from(report),
                    Err(e) => StatusMessage::from(e),
                };
                println!("{}", serde_json::to_string(&status).unwrap_or_default());
            } else if let Ok(report) = &result {
                print_report(report);
            }
            result.map(|_| ExitCode::SUCCESS)
        }
        Command::Load { paths } => {
            for path in paths {
                print_report(&ingestor.ingest_path(&path)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::LoadDir { dir } => {
            let mut failed = 0;
            for file in ingestor.ingest_directory(&dir)? {
                match &file.result {
                    Ok(report) => print_report(report),
                    Err(e) => {
                        failed += 1;
                        println!("{}: {e}", file.path.display());
                    }
                }
            }
            if failed > 0 {
                eprintln!("{failed} file(s) under {} could not be ingested", dir.display());
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Download { dest } => {
            let dest = dest.unwrap_or_else(|| ingestor.config().download_dir.clone());
            let downloaded = ingestor.download_all_new_files(&dest)?;
            if downloaded.is_empty() {
                println!("No new files.");
            }
            for path in downloaded {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_report(report: &IngestionReport) {
    for line in report.status_lines() {
        println!("{line}");
    }
}

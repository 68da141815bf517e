//! Top-level coordination of one ingestion call.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use walkdir::WalkDir;

use super::loader::load_rows;
use super::materialize::{MaterializeResult, materialize};
use super::report::{IngestionReport, SheetOutcome, SheetReport};
use super::strategy::LoadStrategy;
use crate::config::{DEFAULT_REMOTE_FOLDER, IngestConfig};
use crate::db::{DatabaseSession, SessionFactory, SqliteSessionFactory};
use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::{
    IngestionContext, IngestionObserver, IngestionSeverity, SourceFormat, parse_source_from_bytes,
    parse_source_from_path,
};
use crate::naming::NamingPolicy;
use crate::remote::download::remote_unavailable;
use crate::remote::{RemoteError, RemoteStore, download_all_new_files};
use crate::schema::{describe_table, drop_blank_rows};
use crate::types::{Sheet, SourceDocument, TableDescriptor};

/// Result of ingesting one file found by [`Ingestor::ingest_directory`].
#[derive(Debug)]
pub struct FileIngestion {
    /// Local path of the file.
    pub path: PathBuf,
    /// Report, or the error that stopped this file.
    pub result: IngestionResult<IngestionReport>,
}

/// Coordinates parsing, table materialization and row loading for whole files.
///
/// The configuration is fixed at construction; every call opens its own database session and
/// shares nothing with other calls.
pub struct Ingestor {
    config: IngestConfig,
    sessions: Box<dyn SessionFactory>,
    store: Option<Box<dyn RemoteStore>>,
    observer: Option<Arc<dyn IngestionObserver>>,
    alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingestor")
            .field("config", &self.config)
            .field("store_set", &self.store.is_some())
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Ingestor {
    /// Create an ingestor using `sessions` for database access and no remote store.
    pub fn new(config: IngestConfig, sessions: impl SessionFactory + 'static) -> Self {
        Self {
            config,
            sessions: Box::new(sessions),
            store: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }

    /// Create an ingestor backed by SQLite and, when configured, SharePoint.
    pub fn from_config(config: IngestConfig) -> IngestionResult<Self> {
        let sessions = SqliteSessionFactory::new(config.database.clone());
        #[cfg_attr(not(feature = "sharepoint"), allow(unused_mut))]
        let mut ingestor = Self::new(config, sessions);

        #[cfg(feature = "sharepoint")]
        if let Some(remote) = &ingestor.config.remote {
            let store = crate::remote::SharePointStore::new(remote).map_err(remote_unavailable)?;
            ingestor.store = Some(Box::new(store));
        }

        Ok(ingestor)
    }

    /// Use `store` for remote ingestion and downloads.
    pub fn with_store(mut self, store: impl RemoteStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Attach an observer for per-sheet outcomes and failures.
    pub fn with_observer(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Severity at or above which failures are also sent to `on_alert`.
    pub fn with_alert_threshold(mut self, severity: IngestionSeverity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    /// The configuration this ingestor was built with.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Fetch `file_name` from the remote folder and load every sheet into
    /// `{prefix}__{sheet}`, replacing existing tables.
    pub fn ingest(&self, file_name: &str, prefix: &str) -> IngestionResult<IngestionReport> {
        self.ingest_remote(file_name, &LoadStrategy::prefixed(prefix))
    }

    /// Fetch `file_name` from the remote folder and load it with `strategy`.
    ///
    /// Fails with [`IngestionError::ConnectionFailed`] when the database or the store is
    /// unreachable and with [`IngestionError::SourceNotFound`] when the folder has no such file.
    pub fn ingest_remote(&self, file_name: &str, strategy: &LoadStrategy) -> IngestionResult<IngestionReport> {
        let deadline = Deadline::start(self.config.timeout);
        let result = self.with_session(|session| {
            let store = self.require_store()?;
            let folder = self.remote_folder();

            deadline.check(0)?;
            let names = store.list_files(folder).map_err(remote_unavailable)?;
            if !names.iter().any(|n| n == file_name) {
                return Err(source_not_found(file_name, folder));
            }

            deadline.check(0)?;
            let bytes = store.fetch_file(folder, file_name).map_err(|e| match e {
                RemoteError::NotFound(_) => source_not_found(file_name, folder),
                other => remote_unavailable(other),
            })?;
            info!(file = file_name, bytes = bytes.len(), "fetched remote file");

            let document = parse_source_from_bytes(file_name, &bytes)?;
            self.run_document(session, &document, strategy, &deadline)
        });
        self.observe_fatal(file_name, result)
    }

    /// Load a local file with the file-derived strategy.
    pub fn ingest_path(&self, path: impl AsRef<Path>) -> IngestionResult<IngestionReport> {
        self.ingest_path_with(path, &LoadStrategy::file_derived())
    }

    /// Load a local file with `strategy`.
    pub fn ingest_path_with(&self, path: impl AsRef<Path>, strategy: &LoadStrategy) -> IngestionResult<IngestionReport> {
        let path = path.as_ref();
        let deadline = Deadline::start(self.config.timeout);
        let result = self.with_session(|session| {
            let document = parse_source_from_path(path)?;
            self.run_document(session, &document, strategy, &deadline)
        });
        self.observe_fatal(&path.display().to_string(), result)
    }

    /// Load every supported file under `dir` (sorted by name) with the file-derived strategy.
    ///
    /// A file that cannot be parsed is recorded and the walk continues; a connection failure
    /// or an expired deadline stops the walk.
    pub fn ingest_directory(&self, dir: impl AsRef<Path>) -> IngestionResult<Vec<FileIngestion>> {
        let mut results = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() || !SourceFormat::is_supported(entry.path()) {
                continue;
            }
            let result = match self.ingest_path(entry.path()) {
                Err(e @ (IngestionError::ConnectionFailed { .. } | IngestionError::DeadlineExceeded { .. })) => {
                    return Err(e);
                }
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping file");
                    Err(e)
                }
                ok => ok,
            };
            results.push(FileIngestion {
                path: entry.into_path(),
                result,
            });
        }
        Ok(results)
    }

    /// Load an already parsed document against a caller-owned session.
    pub fn ingest_document(
        &self,
        session: &mut dyn DatabaseSession,
        document: &SourceDocument,
        strategy: &LoadStrategy,
    ) -> IngestionResult<IngestionReport> {
        let deadline = Deadline::start(self.config.timeout);
        self.run_document(session, document, strategy, &deadline)
    }

    /// Download every supported remote file not already present in `destination_dir`.
    pub fn download_all_new_files(&self, destination_dir: impl AsRef<Path>) -> IngestionResult<Vec<PathBuf>> {
        let store = self.require_store()?;
        download_all_new_files(store, self.remote_folder(), destination_dir)
    }

    fn run_document(
        &self,
        session: &mut dyn DatabaseSession,
        document: &SourceDocument,
        strategy: &LoadStrategy,
        deadline: &Deadline,
    ) -> IngestionResult<IngestionReport> {
        let mut report = IngestionReport::new(&document.origin, strategy.naming.prefix().map(str::to_owned));
        for sheet in &document.sheets {
            deadline.check(report.sheets.len())?;
            report.sheets.push(self.ingest_sheet(session, document, sheet, strategy));
        }
        info!(origin = %document.origin, status = %report.status_message(), "file ingested");
        Ok(report)
    }

    fn ingest_sheet(
        &self,
        session: &mut dyn DatabaseSession,
        document: &SourceDocument,
        sheet: &Sheet,
        strategy: &LoadStrategy,
    ) -> SheetReport {
        let sheet_part = match (&strategy.naming, document.is_single_sheet()) {
            (NamingPolicy::FileDerived, true) => None,
            _ => Some(sheet.name.as_str()),
        };
        let table_name = strategy.naming.table_name(&document.origin, sheet_part);
        info!(sheet = %sheet.name, table = %table_name, "loading sheet");

        let filtered;
        let sheet = if strategy.drop_blank_rows {
            filtered = drop_blank_rows(sheet);
            &filtered
        } else {
            sheet
        };
        let table = describe_table(table_name, sheet);
        let ctx = IngestionContext::sheet(&document.origin, &sheet.name, &table.name);

        let outcome = match load_sheet(session, &table, sheet, strategy) {
            Ok(outcome) => {
                if let Some(obs) = &self.observer {
                    obs.on_sheet_loaded(&ctx, &outcome);
                }
                outcome
            }
            Err(e) => {
                warn!(sheet = %sheet.name, table = %table.name, error = %e, "sheet failed");
                self.notify_failure(&ctx, &e);
                SheetOutcome::Failed { error: e.to_string() }
            }
        };

        SheetReport {
            sheet: sheet.name.clone(),
            table: table.name,
            outcome,
        }
    }

    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut dyn DatabaseSession) -> IngestionResult<T>,
    ) -> IngestionResult<T> {
        let mut session = self
            .sessions
            .open_session()
            .map_err(IngestionError::database_unavailable)?;
        let result = f(session.as_mut());
        if let Err(e) = session.close() {
            warn!(error = %e, "failed to close database session");
        }
        result
    }

    fn require_store(&self) -> IngestionResult<&dyn RemoteStore> {
        self.store.as_deref().ok_or_else(|| IngestionError::Config {
            message: "no remote store configured".to_string(),
        })
    }

    fn remote_folder(&self) -> &str {
        self.config
            .remote
            .as_ref()
            .map_or(DEFAULT_REMOTE_FOLDER, |r| r.folder.as_str())
    }

    fn observe_fatal(&self, origin: &str, result: IngestionResult<IngestionReport>) -> IngestionResult<IngestionReport> {
        if let Err(e) = &result {
            self.notify_failure(&IngestionContext::file(origin), e);
        }
        result
    }

    fn notify_failure(&self, ctx: &IngestionContext, error: &IngestionError) {
        if let Some(obs) = &self.observer {
            let severity = IngestionSeverity::of(error);
            obs.on_failure(ctx, severity, error);
            if severity >= self.alert_at_or_above {
                obs.on_alert(ctx, severity, error);
            }
        }
    }
}

fn load_sheet(
    session: &mut dyn DatabaseSession,
    table: &TableDescriptor,
    sheet: &Sheet,
    strategy: &LoadStrategy,
) -> IngestionResult<SheetOutcome> {
    let materialized = materialize(session, table, strategy.existing)?;
    if materialized == MaterializeResult::Skipped {
        return Ok(SheetOutcome::SkippedExisting);
    }

    let counts = load_rows(session, table, &sheet.rows, strategy.discipline)?;
    Ok(match (materialized, counts.failed) {
        (_, failed) if failed > 0 => SheetOutcome::PartialFailure {
            inserted: counts.inserted,
            failed,
        },
        (MaterializeResult::Replaced, _) => SheetOutcome::ReplacedAndLoaded {
            inserted: counts.inserted,
        },
        _ => SheetOutcome::CreatedAndLoaded {
            inserted: counts.inserted,
        },
    })
}

fn source_not_found(name: &str, folder: &str) -> IngestionError {
    IngestionError::SourceNotFound {
        name: name.to_owned(),
        folder: folder.to_owned(),
    }
}

/// Optional wall-clock limit for one call.
#[derive(Debug, Clone, Copy)]
struct Deadline(Option<Instant>);

impl Deadline {
    fn start(timeout: Option<Duration>) -> Self {
        Self(timeout.and_then(|t| Instant::now().checked_add(t)))
    }

    fn check(&self, completed_sheets: usize) -> IngestionResult<()> {
        match self.0 {
            Some(at) if Instant::now() >= at => Err(IngestionError::DeadlineExceeded { completed_sheets }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_expires_immediately() {
        let deadline = Deadline::start(Some(Duration::ZERO));
        assert!(matches!(
            deadline.check(3),
            Err(IngestionError::DeadlineExceeded { completed_sheets: 3 })
        ));
        assert!(Deadline::start(None).check(0).is_ok());
    }
}

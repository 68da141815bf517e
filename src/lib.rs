//! `sheet-sql-ingest` loads tabular files (CSV and multi-sheet workbooks) from a document store
//! into a relational database, one table per sheet, every column stored as text.
//!
//! The primary entrypoint is [`pipeline::Ingestor`], which:
//!
//! - locates a source (a local path, or a file fetched by name from a [`remote::RemoteStore`])
//! - parses it into sheets ([`ingestion`])
//! - derives a table name per sheet ([`naming`]) and projects its columns ([`schema`])
//! - creates, replaces or skips the table and loads its rows ([`pipeline`])
//! - aggregates a per-sheet outcome and an overall status string ([`pipeline::IngestionReport`])
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension):**
//!
//! - **CSV**: `.csv` (always one sheet, named after the file stem)
//! - **Excel/workbooks** (Cargo feature `excel`, on by default): `.xlsx`, `.xls`, `.xlsm`,
//!   `.xlsb`, `.ods` (one sheet per worksheet)
//!
//! ## Load strategies
//!
//! Two strategies are provided; callers pick one per call:
//!
//! - [`pipeline::LoadStrategy::file_derived`]: table `{file}_{sheet}` (or `{file}` for CSV),
//!   existing tables are skipped, rows are inserted one at a time and rejected rows are
//!   counted, all-empty rows are dropped.
//! - [`pipeline::LoadStrategy::prefixed`]: table `{prefix}__{sheet}`, existing tables are
//!   dropped and recreated, each sheet is inserted as one batch.
//!
//! ## Quick example: load a local workbook into SQLite
//!
//! ```no_run
//! use sheet_sql_ingest::config::IngestConfig;
//! use sheet_sql_ingest::pipeline::Ingestor;
//!
//! # fn main() -> Result<(), sheet_sql_ingest::IngestionError> {
//! let ingestor = Ingestor::from_config(IngestConfig::default())?;
//! let report = ingestor.ingest_path("downloads/Sales-Report.xlsx")?;
//! for line in report.status_lines() {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`]: orchestrator, table materializer, row loader and reports
//! - [`ingestion`]: CSV/workbook parsing and observer hooks
//! - [`naming`], [`schema`]: table-name derivation and column projection
//! - [`db`]: database session trait and its SQLite implementation
//! - [`remote`]: remote store trait, SharePoint and directory implementations, bulk download
//! - [`config`]: explicit configuration object
//! - [`types`]: sheets, values and table descriptors
//! - [`error`]: error types used across the crate

pub mod config;
pub mod db;
pub mod error;
pub mod ingestion;
pub mod naming;
pub mod pipeline;
pub mod remote;
pub mod schema;
pub mod types;

pub use error::{IngestionError, IngestionResult};

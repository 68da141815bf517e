//! The ingestion pipeline.
//!
//! For every sheet of a [`crate::types::SourceDocument`] the [`Ingestor`] derives a table name
//! ([`crate::naming`]), projects text columns ([`crate::schema`]), materializes the table
//! ([`materialize`]), loads the rows ([`loader`]) and records a [`SheetOutcome`]. Sheet-level
//! failures are folded into the [`IngestionReport`]; only connection failures, a missing source
//! and an expired deadline end a call early.
//!
//! ```no_run
//! use sheet_sql_ingest::config::IngestConfig;
//! use sheet_sql_ingest::pipeline::Ingestor;
//!
//! # fn main() -> Result<(), sheet_sql_ingest::IngestionError> {
//! let ingestor = Ingestor::from_config(IngestConfig::from_env()?)?;
//! let report = ingestor.ingest("Sales-Report.xlsx", "CustomTable")?;
//! println!("{}", report.status_message());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod materialize;
pub mod orchestrator;
pub mod report;
pub mod strategy;

pub use loader::{InsertDiscipline, LoadResult, load_rows};
pub use materialize::{ExistingTablePolicy, MaterializeResult, materialize};
pub use orchestrator::{FileIngestion, Ingestor};
pub use report::{IngestionReport, SheetOutcome, SheetReport, StatusMessage};
pub use strategy::LoadStrategy;

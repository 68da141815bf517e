use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::db::SessionError;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Which collaborator a connection failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// The relational store.
    Database,
    /// The remote document store.
    RemoteStore,
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => f.write_str("database"),
            Self::RemoteStore => f.write_str("remote store"),
        }
    }
}

/// Error type returned by parsing, loading and orchestration functions.
///
/// `ConnectionFailed`, `SourceNotFound` and `DeadlineExceeded` end an ingestion call.
/// `Schema` and `RowInsert` are scoped to one sheet (or one row) and are folded into the
/// [`crate::pipeline::IngestionReport`] instead of being returned.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook parsing error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV parsing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The source has an extension this crate cannot parse.
    #[error("unsupported source format: {message}")]
    UnsupportedFormat { message: String },

    /// Could not connect or authenticate against a collaborator.
    #[error("{target} connection failed: {message}")]
    ConnectionFailed {
        target: ConnectionTarget,
        message: String,
    },

    /// The requested file is not present in the remote folder.
    #[error("file '{name}' not found in remote folder '{folder}'")]
    SourceNotFound { name: String, folder: String },

    /// DDL for a destination table was rejected.
    #[error("schema error on table '{table}': {source}")]
    Schema {
        table: String,
        #[source]
        source: SessionError,
    },

    /// A row (or a whole batch) could not be inserted.
    #[error("failed to insert row {row} into '{table}': {message}")]
    RowInsert {
        table: String,
        row: usize,
        message: String,
    },

    /// The configured overall deadline elapsed before the call finished.
    #[error("ingestion deadline exceeded after {completed_sheets} sheet(s)")]
    DeadlineExceeded { completed_sheets: usize },

    /// Configuration is missing or malformed.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A remote file could not be fetched or written locally.
    #[error("failed to download '{name}' to {path:?}: {message}")]
    Download {
        name: String,
        path: PathBuf,
        message: String,
    },
}

impl IngestionError {
    /// `true` for the kinds that abort a whole ingestion call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::SourceNotFound { .. } | Self::DeadlineExceeded { .. }
        )
    }

    pub(crate) fn database_unavailable(source: impl fmt::Display) -> Self {
        Self::ConnectionFailed {
            target: ConnectionTarget::Database,
            message: source.to_string(),
        }
    }
}

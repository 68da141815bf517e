//! Per-sheet outcomes and the aggregated, human-readable run summary.

use std::fmt;

use serde::Serialize;

/// What happened to one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetOutcome {
    /// Table did not exist; it was created and all rows were inserted.
    CreatedAndLoaded { inserted: usize },
    /// Table already existed and was left untouched.
    SkippedExisting,
    /// Table was dropped (if present), recreated, and all rows were inserted.
    ReplacedAndLoaded { inserted: usize },
    /// Table was materialized but some rows were rejected.
    PartialFailure { inserted: usize, failed: usize },
    /// A schema or batch-load error aborted this sheet.
    Failed { error: String },
}

impl SheetOutcome {
    /// `true` unless the sheet-level processing failed.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for SheetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreatedAndLoaded { inserted } => write!(f, "created ({inserted} rows)"),
            Self::SkippedExisting => f.write_str("skipped (table exists)"),
            Self::ReplacedAndLoaded { inserted } => write!(f, "replaced ({inserted} rows)"),
            Self::PartialFailure { inserted, failed } => {
                write!(f, "partially loaded ({inserted} inserted, {failed} failed)")
            }
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Outcome of one sheet, with the table it targeted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetReport {
    /// Sheet name in the source document.
    pub sheet: String,
    /// Destination table name.
    pub table: String,
    /// What happened.
    pub outcome: SheetOutcome,
}

impl SheetReport {
    /// One-line status for this sheet.
    pub fn status_line(&self) -> String {
        format!("Sheet '{}' -> '{}': {}", self.sheet, self.table, self.outcome)
    }
}

/// Aggregated outcome of ingesting one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    /// Origin file name.
    pub origin: String,
    /// Prefix used for naming, when prefix-derived.
    pub prefix: Option<String>,
    /// Per-sheet results in document order.
    pub sheets: Vec<SheetReport>,
}

impl IngestionReport {
    /// Create an empty report.
    pub fn new(origin: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            origin: origin.into(),
            prefix,
            sheets: Vec::new(),
        }
    }

    /// Number of sheets whose processing failed.
    pub fn failed_sheets(&self) -> usize {
        self.sheets.iter().filter(|s| !s.outcome.is_success()).count()
    }

    /// Total rows rejected across sheets loaded with fault isolation.
    pub fn failed_rows(&self) -> usize {
        self.sheets
            .iter()
            .map(|s| match s.outcome {
                SheetOutcome::PartialFailure { failed, .. } => failed,
                _ => 0,
            })
            .sum()
    }

    /// Overall status string for the file.
    pub fn status_message(&self) -> String {
        let failed = self.failed_sheets();
        let total = self.sheets.len();
        match (&self.prefix, failed) {
            (Some(prefix), 0) => format!(
                "File '{}' with all sheets ingested using prefix '{prefix}'.",
                self.origin
            ),
            (None, 0) => format!("File '{}' ingested: {total} sheet(s) processed.", self.origin),
            (Some(prefix), k) => format!(
                "File '{}' ingested with {k} of {total} sheet(s) failed using prefix '{prefix}'.",
                self.origin
            ),
            (None, k) => format!(
                "File '{}' ingested with {k} of {total} sheet(s) failed.",
                self.origin
            ),
        }
    }

    /// The overall status followed by one line per sheet.
    pub fn status_lines(&self) -> Vec<String> {
        std::iter::once(self.status_message())
            .chain(self.sheets.iter().map(SheetReport::status_line))
            .collect()
    }
}

/// Response body handed back to a front end, e.g. `{"status": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    /// Overall status.
    pub status: String,
}

impl From<&IngestionReport> for StatusMessage {
    fn from(report: &IngestionReport) -> Self {
        Self {
            status: report.status_message(),
        }
    }
}

impl From<&crate::error::IngestionError> for StatusMessage {
    fn from(error: &crate::error::IngestionError) -> Self {
        Self {
            status: error.to_string(),
        }
    }
}

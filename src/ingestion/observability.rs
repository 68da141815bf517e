use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use crate::error::IngestionError;
use crate::pipeline::SheetOutcome;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (e.g. some rows of a sheet were rejected).
    Warning,
    /// Error-level event (a sheet failed).
    Error,
    /// Critical error (connection, I/O or deadline failures that end the call).
    Critical,
}

impl IngestionSeverity {
    /// Severity of an error as reported to observers.
    pub fn of(error: &IngestionError) -> Self {
        match error {
            IngestionError::Io(_)
            | IngestionError::ConnectionFailed { .. }
            | IngestionError::DeadlineExceeded { .. }
            | IngestionError::Download { .. } => Self::Critical,
            IngestionError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => Self::Critical,
                _ => Self::Error,
            },
            #[cfg(feature = "excel")]
            IngestionError::Excel(_) => Self::Error,
            IngestionError::UnsupportedFormat { .. }
            | IngestionError::SourceNotFound { .. }
            | IngestionError::Schema { .. }
            | IngestionError::RowInsert { .. }
            | IngestionError::Config { .. } => Self::Error,
        }
    }
}

/// Where an event happened.
#[derive(Debug, Clone, Default)]
pub struct IngestionContext {
    /// Origin file name.
    pub origin: String,
    /// Sheet being processed, if the event is sheet-scoped.
    pub sheet: Option<String>,
    /// Destination table, if known.
    pub table: Option<String>,
}

impl IngestionContext {
    /// Context for a whole file.
    pub fn file(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Default::default()
        }
    }

    /// Context for one sheet loaded into `table`.
    pub fn sheet(origin: impl Into<String>, sheet: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            sheet: Some(sheet.into()),
            table: Some(table.into()),
        }
    }
}

impl fmt::Display for IngestionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "origin={}", self.origin)?;
        if let Some(sheet) = &self.sheet {
            write!(f, " sheet={sheet}")?;
        }
        if let Some(table) = &self.table {
            write!(f, " table={table}")?;
        }
        Ok(())
    }
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when a sheet finished without a sheet-level error (including skips and partial
    /// row failures).
    fn on_sheet_loaded(&self, _ctx: &IngestionContext, _outcome: &SheetOutcome) {}

    /// Called when a sheet or a whole call fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_sheet_loaded(&self, ctx: &IngestionContext, outcome: &SheetOutcome) {
        for o in &self.observers {
            o.on_sheet_loaded(ctx, outcome);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Forwards ingestion events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_sheet_loaded(&self, ctx: &IngestionContext, outcome: &SheetOutcome) {
        match outcome {
            SheetOutcome::PartialFailure { inserted, failed } => {
                warn!(%ctx, inserted, failed, "sheet loaded with rejected rows");
            }
            other => info!(%ctx, outcome = %other, "sheet ingested"),
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        warn!(%ctx, ?severity, %error, "ingestion failure");
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        error!(%ctx, ?severity, %error, "ingestion alert");
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_sheet_loaded(&self, ctx: &IngestionContext, outcome: &SheetOutcome) {
        self.append_line(&format!("{} ok {ctx} outcome={outcome}", unix_ts()));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} fail severity={severity:?} {ctx} err={error}",
            unix_ts()
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} ALERT severity={severity:?} {ctx} err={error}",
            unix_ts()
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

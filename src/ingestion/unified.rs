//! Unified parsing entrypoint.
//!
//! Most callers should use [`parse_source_from_path`] for local files or
//! [`parse_source_from_bytes`] for fetched remote files. Both infer the [`SourceFormat`] from
//! the file extension and return a [`SourceDocument`].
//!
//! ```no_run
//! use sheet_sql_ingest::ingestion::parse_source_from_path;
//!
//! # fn main() -> Result<(), sheet_sql_ingest::IngestionError> {
//! let doc = parse_source_from_path("downloads/Sales-Report.xlsx")?;
//! for sheet in &doc.sheets {
//!     println!("{}: {} rows", sheet.name, sheet.row_count());
//! }
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::Serialize;

use crate::error::{IngestionError, IngestionResult};
use crate::types::SourceDocument;

use super::csv;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceFormat {
    /// Comma-separated values; always a single sheet.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Infer the format of a file name or path.
    pub fn from_file_name(name: impl AsRef<Path>) -> IngestionResult<Self> {
        let path = name.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| IngestionError::UnsupportedFormat {
                message: format!("path has no extension ({})", path.display()),
            })?;

        Self::from_extension(ext).ok_or_else(|| IngestionError::UnsupportedFormat {
            message: format!("extension '{ext}' for path ({})", path.display()),
        })
    }

    /// `true` when `name` has a supported extension.
    pub fn is_supported(name: impl AsRef<Path>) -> bool {
        Self::from_file_name(name).is_ok()
    }
}

/// Parse a local file into a [`SourceDocument`] whose origin is the file name.
pub fn parse_source_from_path(path: impl AsRef<Path>) -> IngestionResult<SourceDocument> {
    let path = path.as_ref();
    let format = SourceFormat::from_file_name(path)?;
    let origin = file_name_of(path);

    let sheets = match format {
        SourceFormat::Csv => vec![csv::parse_csv_from_path(path, &stem_of(path))?],
        SourceFormat::Excel => parse_workbook_dispatch(WorkbookInput::Path(path))?,
    };
    Ok(SourceDocument::new(origin, format, sheets))
}

/// Parse an in-memory file named `file_name` into a [`SourceDocument`].
pub fn parse_source_from_bytes(file_name: &str, bytes: &[u8]) -> IngestionResult<SourceDocument> {
    let format = SourceFormat::from_file_name(file_name)?;
    let path = Path::new(file_name);

    let sheets = match format {
        SourceFormat::Csv => vec![csv::parse_csv_from_bytes(bytes, &stem_of(path))?],
        SourceFormat::Excel => parse_workbook_dispatch(WorkbookInput::Bytes(bytes))?,
    };
    Ok(SourceDocument::new(file_name_of(path), format, sheets))
}

enum WorkbookInput<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

fn parse_workbook_dispatch(input: WorkbookInput<'_>) -> IngestionResult<Vec<crate::types::Sheet>> {
    #[cfg(feature = "excel")]
    {
        use super::excel;

        match input {
            WorkbookInput::Path(path) => excel::parse_workbook_from_path(path),
            WorkbookInput::Bytes(bytes) => excel::parse_workbook_from_bytes(bytes),
        }
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = input;
        Err(IngestionError::UnsupportedFormat {
            message: "workbook parsing not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .unwrap_or_else(|| path.display().to_string())
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_from_extension() {
        assert_eq!(SourceFormat::from_extension("CSV"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_extension("xlsx"), Some(SourceFormat::Excel));
        assert_eq!(SourceFormat::from_extension("json"), None);
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let err = SourceFormat::from_file_name("README").unwrap_err();
        assert!(err.to_string().contains("no extension"));
        assert!(!SourceFormat::is_supported("notes.txt"));
        assert!(SourceFormat::is_supported("Sales Report.xlsx"));
    }

    #[test]
    fn csv_bytes_become_one_sheet_named_after_stem() {
        let doc = parse_source_from_bytes("Monthly Sales.csv", b"Region,Total\nNorth,10\n").unwrap();
        assert_eq!(doc.origin, "Monthly Sales.csv");
        assert_eq!(doc.format, SourceFormat::Csv);
        assert_eq!(doc.sheets.len(), 1);
        assert_eq!(doc.sheets[0].name, "Monthly Sales");
        assert!(doc.is_single_sheet());
    }
}

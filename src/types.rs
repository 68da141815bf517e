//! Core data model types.
//!
//! Parsing produces a [`SourceDocument`] made of [`Sheet`]s whose cells are [`Value`]s. The
//! schema projector turns a sheet into a [`TableDescriptor`] describing the destination table.

use serde::Serialize;

use crate::ingestion::SourceFormat;

/// Storage kind of a destination column.
///
/// Every column is loaded as unbounded text so mixed-type cells survive as display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StorageKind {
    /// Unbounded text (`TEXT` in SQLite, `NVARCHAR(MAX)` in SQL Server).
    #[default]
    UnboundedText,
}

impl StorageKind {
    /// SQL type name used in `CREATE TABLE`.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::UnboundedText => "TEXT",
        }
    }
}

/// A single named column of a destination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Column name after normalization.
    pub name: String,
    /// Column storage kind.
    pub kind: StorageKind,
}

impl Column {
    /// Create a new text column.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StorageKind::UnboundedText,
        }
    }
}

/// Identity and shape of a destination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    /// Derived table name.
    pub name: String,
    /// Ordered list of columns.
    pub columns: Vec<Column>,
}

impl TableDescriptor {
    /// Create a new descriptor.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Iterate column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Text representation bound into `INSERT` statements; `None` becomes SQL `NULL`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int64(i) => Some(i.to_string()),
            Self::Float64(f) if f.is_nan() => None,
            Self::Float64(f) => Some(f.to_string()),
            Self::Bool(true) => Some("True".to_string()),
            Self::Bool(false) => Some("False".to_string()),
            Self::Utf8(s) => Some(s.clone()),
        }
    }

    /// `true` when the cell contributes nothing (null or NaN).
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float64(f) => f.is_nan(),
            _ => false,
        }
    }
}

/// One tabular unit: a CSV file's single table, or one worksheet of a workbook.
///
/// Rows are stored as `Vec<Vec<Value>>`. Rows are expected to have one cell per header, but
/// ragged rows are kept so that loading can reject them one at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Sheet name, unique within its document.
    pub name: String,
    /// Ordered column headers as read from the source.
    pub headers: Vec<String>,
    /// Row-major cell storage.
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    /// Create a sheet from headers and rows.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Create a new sheet containing only rows that match `predicate`.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows,
        }
    }
}

/// Returns `true` if every cell of `row` is null.
pub fn is_blank_row(row: &[Value]) -> bool {
    row.iter().all(Value::is_null)
}

/// A parsed source file: its origin identifier and its sheets in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// File name the document was parsed from.
    pub origin: String,
    /// Format the document was parsed as.
    pub format: SourceFormat,
    /// Sheets in document order.
    pub sheets: Vec<Sheet>,
}

impl SourceDocument {
    /// Create a document.
    pub fn new(origin: impl Into<String>, format: SourceFormat, sheets: Vec<Sheet>) -> Self {
        Self {
            origin: origin.into(),
            format,
            sheets,
        }
    }

    /// `true` when the document is a single-sheet CSV whose sheet name is not part of the
    /// file-derived table name.
    pub fn is_single_sheet(&self) -> bool {
        self.format == SourceFormat::Csv
    }
}

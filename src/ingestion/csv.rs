//! CSV parsing.

use std::io::Read;
use std::path::Path;

use crate::error::IngestionResult;
use crate::types::{Sheet, Value};

/// Parse a CSV file into a single [`Sheet`] named `sheet_name`.
///
/// Rules:
///
/// - CSV must have a header row.
/// - Empty fields become [`Value::Null`]; everything else is kept verbatim as text.
/// - Records with a different field count than the header are kept as-is.
pub fn parse_csv_from_path(path: impl AsRef<Path>, sheet_name: &str) -> IngestionResult<Sheet> {
    let mut rdr = reader_builder().from_path(path)?;
    parse_csv_from_reader(&mut rdr, sheet_name)
}

/// Parse CSV data held in memory (e.g. a fetched remote file).
pub fn parse_csv_from_bytes(bytes: &[u8], sheet_name: &str) -> IngestionResult<Sheet> {
    let mut rdr = reader_builder().from_reader(bytes);
    parse_csv_from_reader(&mut rdr, sheet_name)
}

/// Parse CSV data from an existing CSV reader.
pub fn parse_csv_from_reader<R: Read>(rdr: &mut csv::Reader<R>, sheet_name: &str) -> IngestionResult<Sheet> {
    let headers = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, h)| header_or_placeholder(idx, h))
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(cell_value).collect());
    }

    Ok(Sheet::new(sheet_name, headers, rows))
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

fn cell_value(raw: &str) -> Value {
    if raw.is_empty() {
        Value::Null
    } else {
        Value::Utf8(raw.to_owned())
    }
}

/// Name used for a header cell that is empty.
pub(crate) fn header_or_placeholder(idx: usize, raw: &str) -> String {
    if raw.trim().is_empty() {
        format!("Unnamed: {idx}")
    } else {
        raw.to_owned()
    }
}

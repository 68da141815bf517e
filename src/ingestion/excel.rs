#![cfg(feature = "excel")]

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, DataType, Range, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use chrono::{Duration, NaiveDateTime};

use crate::error::IngestionResult;
use crate::types::{Sheet, Value};

use super::csv::header_or_placeholder;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse every worksheet of a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into [`Sheet`]s.
///
/// Behavior:
/// - Worksheets are returned in workbook order
/// - The first non-empty row of a worksheet is its header row
/// - Every later row is a data row, including fully empty ones
/// - A worksheet with no non-empty row yields a sheet with no headers and no rows
/// - Date/time cells become `YYYY-MM-DD HH:MM:SS` text, durations `[N days, ]H:MM:SS`
pub fn parse_workbook_from_path(path: impl AsRef<Path>) -> IngestionResult<Vec<Sheet>> {
    let mut workbook = open_workbook_auto(path)?;
    parse_workbook(&mut workbook)
}

/// Parse a workbook held in memory (e.g. a fetched remote file).
pub fn parse_workbook_from_bytes(bytes: &[u8]) -> IngestionResult<Vec<Sheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    parse_workbook(&mut workbook)
}

fn parse_workbook<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> IngestionResult<Vec<Sheet>> {
    let names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        sheets.push(sheet_from_range(&name, &range));
    }
    Ok(sheets)
}

fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut rows_iter = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let Some(header_row) = rows_iter.next() else {
        return Sheet::new(name, Vec::new(), Vec::new());
    };
    let headers = header_row
        .iter()
        .enumerate()
        .map(|(idx, c)| header_or_placeholder(idx, &cell_to_header_string(c)))
        .collect();

    let rows = rows_iter
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    Sheet::new(name, headers, rows)
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => temporal_text(c),
        Data::Error(_) => String::new(),
        Data::Empty => String::new(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Utf8(s.clone()),
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) if f.is_nan() => Value::Null,
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => Value::Utf8(temporal_text(c)),
    }
}

/// Display text of a date/time or duration cell; the raw value when it cannot be converted.
fn temporal_text(c: &Data) -> String {
    let text = match c {
        Data::DateTime(dt) if dt.is_duration() => dt.as_duration().map(duration_text),
        Data::DateTime(dt) => dt.as_datetime().map(datetime_text),
        Data::DateTimeIso(_) => c.as_datetime().map(datetime_text),
        Data::DurationIso(_) => c.as_duration().map(duration_text),
        _ => None,
    };
    text.unwrap_or_else(|| c.to_string())
}

fn datetime_text(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn duration_text(d: Duration) -> String {
    let (sign, d) = if d < Duration::zero() { ("-", -d) } else { ("", d) };
    let secs = d.num_seconds();
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let clock = format!("{}:{:02}:{:02}", rem / 3_600, rem % 3_600 / 60, rem % 60);
    match days {
        0 => format!("{sign}{clock}"),
        1 => format!("{sign}1 day, {clock}"),
        n => format!("{sign}{n} days, {clock}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_is_first_non_empty_row() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 1));
        range.set_value((1, 0), Data::String("Region".to_string()));
        range.set_value((2, 0), Data::String("North".to_string()));
        range.set_value((2, 1), Data::Float(12.5));

        let sheet = sheet_from_range("Q1", &range);
        assert_eq!(sheet.headers, vec!["Region".to_string(), "Unnamed: 1".to_string()]);
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(
            sheet.rows[0],
            vec![Value::Utf8("North".to_string()), Value::Float64(12.5)]
        );
        assert_eq!(sheet.rows[1], vec![Value::Null, Value::Null]);
    }

    #[test]
    fn empty_worksheet_has_no_headers() {
        let range: Range<Data> = Range::empty();
        let sheet = sheet_from_range("Blank", &range);
        assert!(sheet.headers.is_empty());
        assert_eq!(sheet.row_count(), 0);
    }

    #[test]
    fn date_cells_use_calendar_text() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};

        let date = Data::DateTime(ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false));
        let noon = Data::DateTime(ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false));
        let span = Data::DateTime(ExcelDateTime::new(1.25, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(convert_cell(&date), Value::Utf8("2024-01-01 00:00:00".to_string()));
        assert_eq!(convert_cell(&noon), Value::Utf8("2024-01-01 12:00:00".to_string()));
        assert_eq!(convert_cell(&span), Value::Utf8("1 day, 6:00:00".to_string()));
        assert_eq!(cell_to_header_string(&date), "2024-01-01 00:00:00");
    }

    #[test]
    fn iso_cells_are_normalized() {
        let iso = Data::DateTimeIso("2024-03-05T07:08:09".to_string());
        assert_eq!(convert_cell(&iso), Value::Utf8("2024-03-05 07:08:09".to_string()));
        let bad = Data::DateTimeIso("not a date".to_string());
        assert_eq!(convert_cell(&bad), Value::Utf8("not a date".to_string()));
    }

    #[test]
    fn numeric_headers_drop_trailing_zero() {
        assert_eq!(cell_to_header_string(&Data::Float(2024.0)), "2024");
        assert_eq!(cell_to_header_string(&Data::Float(1.5)), "1.5");
    }
}

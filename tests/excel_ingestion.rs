#![cfg(feature = "excel_test_writer")]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use sheet_sql_ingest::config::{DatabaseConfig, IngestConfig};
use sheet_sql_ingest::db::SqliteSessionFactory;
use sheet_sql_ingest::ingestion::excel::{parse_workbook_from_bytes, parse_workbook_from_path};
use sheet_sql_ingest::ingestion::{SourceFormat, parse_source_from_path};
use sheet_sql_ingest::pipeline::{Ingestor, SheetOutcome, StatusMessage};
use sheet_sql_ingest::remote::LocalFolderStore;
use sheet_sql_ingest::types::Value;

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("sheet-sql-ingest-{name}-{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Two worksheets, `Q1` (two data rows) and `Q2` (one data row after a blank line).
fn write_sales_report(path: &Path) {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();

    let q1 = wb.add_worksheet();
    q1.set_name("Q1").unwrap();
    q1.write_string(0, 0, "Region").unwrap();
    q1.write_string(0, 1, "Total Sales").unwrap();
    q1.write_string(1, 0, "North").unwrap();
    q1.write_number(1, 1, 1200).unwrap();
    q1.write_string(2, 0, "South").unwrap();
    q1.write_number(2, 1, 98.5).unwrap();

    let q2 = wb.add_worksheet();
    q2.set_name("Q2").unwrap();
    q2.write_string(0, 0, "Region").unwrap();
    q2.write_string(0, 1, "Active").unwrap();
    q2.write_string(2, 0, "East").unwrap();
    q2.write_boolean(2, 1, true).unwrap();

    wb.save(path).unwrap();
}

fn ingestor(db: &Path) -> Ingestor {
    let config = IngestConfig {
        database: DatabaseConfig {
            path: db.to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };
    let sessions = SqliteSessionFactory::new(config.database.clone());
    Ingestor::new(config, sessions)
}

fn column(db: &Path, sql: &str) -> Vec<Option<String>> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn.prepare(sql).unwrap();
    let values = stmt
        .query_map([], |r| r.get::<_, Option<String>>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    values
}

#[test]
fn workbook_sheets_are_parsed_in_order() {
    let dir = tmp_dir("parse-xlsx");
    let path = dir.join("Sales-Report.xlsx");
    write_sales_report(&path);

    let sheets = parse_workbook_from_path(&path).unwrap();

    let names: Vec<_> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Q1", "Q2"]);
    assert_eq!(sheets[0].headers, vec!["Region", "Total Sales"]);
    assert_eq!(sheets[0].row_count(), 2);
    assert_eq!(sheets[0].rows[1][0], Value::Utf8("South".to_string()));
    assert_eq!(sheets[0].rows[1][1], Value::Float64(98.5));
}

#[test]
fn blank_line_inside_sheet_is_a_null_row() {
    let dir = tmp_dir("blank-xlsx");
    let path = dir.join("Sales-Report.xlsx");
    write_sales_report(&path);

    let sheets = parse_workbook_from_bytes(&fs::read(&path).unwrap()).unwrap();

    assert_eq!(sheets[1].row_count(), 2);
    assert_eq!(sheets[1].rows[0], vec![Value::Null, Value::Null]);
    assert_eq!(
        sheets[1].rows[1],
        vec![Value::Utf8("East".to_string()), Value::Bool(true)]
    );
}

#[test]
fn workbook_document_is_multi_sheet() {
    let dir = tmp_dir("doc-xlsx");
    let path = dir.join("Sales-Report.xlsx");
    write_sales_report(&path);

    let doc = parse_source_from_path(&path).unwrap();
    assert_eq!(doc.origin, "Sales-Report.xlsx");
    assert_eq!(doc.format, SourceFormat::Excel);
    assert!(!doc.is_single_sheet());
}

#[test]
fn remote_workbook_replaces_prefixed_tables() {
    let dir = tmp_dir("remote-xlsx");
    let db = dir.join("ingest.db");
    let remote = dir.join("remote");
    fs::create_dir_all(remote.join("api")).unwrap();
    write_sales_report(&remote.join("api").join("Sales-Report.xlsx"));

    let ing = ingestor(&db).with_store(LocalFolderStore::new(&remote));
    let report = ing.ingest("Sales-Report.xlsx", "CustomTable").unwrap();

    let tables: Vec<_> = report.sheets.iter().map(|s| s.table.as_str()).collect();
    assert_eq!(tables, vec!["CustomTable__Q1", "CustomTable__Q2"]);
    assert_eq!(
        StatusMessage::from(&report).status,
        "File 'Sales-Report.xlsx' with all sheets ingested using prefix 'CustomTable'."
    );
    assert_eq!(
        column(&db, "SELECT Total_Sales FROM CustomTable__Q1 ORDER BY rowid"),
        vec![Some("1200".to_string()), Some("98.5".to_string())]
    );
    assert_eq!(
        column(&db, "SELECT Active FROM CustomTable__Q2 ORDER BY rowid"),
        vec![None, Some("True".to_string())]
    );

    // A second run replaces rather than appends.
    let again = ing.ingest("Sales-Report.xlsx", "CustomTable").unwrap();
    assert_eq!(again.sheets[0].outcome, SheetOutcome::ReplacedAndLoaded { inserted: 2 });
    assert_eq!(column(&db, "SELECT Region FROM CustomTable__Q1").len(), 2);
}

#[test]
fn local_workbook_uses_file_and_sheet_names() {
    let dir = tmp_dir("local-xlsx");
    let db = dir.join("ingest.db");
    let path = dir.join("Sales-Report.xlsx");
    write_sales_report(&path);

    let report = ingestor(&db).ingest_path(&path).unwrap();

    let tables: Vec<_> = report.sheets.iter().map(|s| s.table.as_str()).collect();
    assert_eq!(tables, vec!["Sales_Report_Q1", "Sales_Report_Q2"]);
    // The blank line of Q2 is dropped by the file-derived strategy.
    assert_eq!(report.sheets[1].outcome, SheetOutcome::CreatedAndLoaded { inserted: 1 });
}

#[test]
fn date_cells_load_as_calendar_text() {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let dir = tmp_dir("dates-xlsx");
    let db = dir.join("ingest.db");
    let path = dir.join("Shipments.xlsx");

    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let stamp_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Log").unwrap();
    ws.write_string(0, 0, "Shipped").unwrap();
    ws.write_string(0, 1, "Logged At").unwrap();
    let shipped = ExcelDateTime::from_ymd(2024, 1, 1).unwrap();
    let logged = ExcelDateTime::from_ymd(2024, 3, 5).unwrap().and_hms(7, 8, 9).unwrap();
    ws.write_datetime_with_format(1, 0, &shipped, &date_format).unwrap();
    ws.write_datetime_with_format(1, 1, &logged, &stamp_format).unwrap();
    wb.save(&path).unwrap();

    let sheets = parse_workbook_from_path(&path).unwrap();
    assert_eq!(sheets[0].rows[0][0].to_text(), Some("2024-01-01 00:00:00".to_string()));

    ingestor(&db).ingest_path(&path).unwrap();
    assert_eq!(
        column(&db, "SELECT Shipped FROM Shipments_Log"),
        vec![Some("2024-01-01 00:00:00".to_string())]
    );
    assert_eq!(
        column(&db, "SELECT Logged_At FROM Shipments_Log"),
        vec![Some("2024-03-05 07:08:09".to_string())]
    );
}

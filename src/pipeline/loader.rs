//! Row loading: serialize sheet rows to text and insert them as bound parameters.

use serde::Serialize;
use tracing::warn;

use crate::db::{DatabaseSession, quote_identifier};
use crate::error::{IngestionError, IngestionResult};
use crate::types::{TableDescriptor, Value};

/// How rows of one sheet are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsertDiscipline {
    /// One statement per row; a rejected row is counted and the rest still load.
    FaultIsolated,
    /// One multi-row operation; any rejected row aborts the whole sheet.
    Batched,
}

/// Row counts produced by [`load_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadResult {
    /// Rows inserted.
    pub inserted: usize,
    /// Rows rejected (only ever non-zero under [`InsertDiscipline::FaultIsolated`]).
    pub failed: usize,
}

/// Parameterized `INSERT` statement for `table`.
pub fn insert_sql(table: &TableDescriptor) -> String {
    let columns = table
        .column_names()
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
        quote_identifier(&table.name)
    )
}

/// Insert `rows` into `table` and commit.
///
/// Rows whose cell count differs from the column count are rejected before reaching the
/// database. Under [`InsertDiscipline::Batched`] any rejection is returned as
/// [`IngestionError::RowInsert`] with nothing inserted; the row number is 1-based.
/// A failed commit is rolled back and reported as a `RowInsert` error on row 0.
pub fn load_rows(
    session: &mut dyn DatabaseSession,
    table: &TableDescriptor,
    rows: &[Vec<Value>],
    discipline: InsertDiscipline,
) -> IngestionResult<LoadResult> {
    if rows.is_empty() {
        return Ok(LoadResult::default());
    }
    let sql = insert_sql(table);
    let result = match discipline {
        InsertDiscipline::FaultIsolated => load_fault_isolated(session, table, &sql, rows),
        InsertDiscipline::Batched => load_batched(session, table, &sql, rows),
    };

    match result {
        Ok(counts) => match session.commit() {
            Ok(()) => Ok(counts),
            Err(e) => {
                let _ = session.rollback();
                Err(row_error(table, 0, format!("commit failed: {e}")))
            }
        },
        Err(e) => {
            let _ = session.rollback();
            Err(e)
        }
    }
}

fn load_fault_isolated(
    session: &mut dyn DatabaseSession,
    table: &TableDescriptor,
    sql: &str,
    rows: &[Vec<Value>],
) -> IngestionResult<LoadResult> {
    let mut counts = LoadResult::default();
    for (idx0, row) in rows.iter().enumerate() {
        let attempt = row_params(table, idx0, row).and_then(|params| {
            session
                .execute(sql, &params)
                .map_err(|e| row_error(table, idx0, e.to_string()))
        });
        match attempt {
            Ok(_) => counts.inserted += 1,
            Err(e) => {
                warn!(table = %table.name, error = %e, "failed to insert row");
                counts.failed += 1;
            }
        }
    }
    Ok(counts)
}

fn load_batched(
    session: &mut dyn DatabaseSession,
    table: &TableDescriptor,
    sql: &str,
    rows: &[Vec<Value>],
) -> IngestionResult<LoadResult> {
    let params = rows
        .iter()
        .enumerate()
        .map(|(idx0, row)| row_params(table, idx0, row))
        .collect::<IngestionResult<Vec<_>>>()?;

    session
        .execute_many(sql, &params)
        .map_err(|e| row_error(table, 0, e.to_string()))?;
    Ok(LoadResult {
        inserted: params.len(),
        failed: 0,
    })
}

fn row_params(table: &TableDescriptor, idx0: usize, row: &[Value]) -> IngestionResult<Vec<Option<String>>> {
    if row.len() != table.columns.len() {
        return Err(row_error(
            table,
            idx0 + 1,
            format!(
                "row has {} cell(s) but table has {} column(s)",
                row.len(),
                table.columns.len()
            ),
        ));
    }
    Ok(row.iter().map(Value::to_text).collect())
}

fn row_error(table: &TableDescriptor, row: usize, message: String) -> IngestionError {
    IngestionError::RowInsert {
        table: table.name.clone(),
        row,
        message,
    }
}

//! Table materialization: make sure the destination table exists in the desired shape.

use serde::Serialize;
use tracing::{debug, info};

use crate::db::{DatabaseSession, SessionError, quote_identifier};
use crate::error::{IngestionError, IngestionResult};
use crate::types::TableDescriptor;

/// What to do when the destination table may already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExistingTablePolicy {
    /// Leave an existing table untouched and skip the sheet.
    SkipIfExists,
    /// Drop any existing table and create it again.
    Replace,
}

/// Result of [`materialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeResult {
    /// The table did not exist and was created.
    Created,
    /// The table existed and was left as-is.
    Skipped,
    /// The table was dropped (if present) and created.
    Replaced,
}

/// `CREATE TABLE` statement with one unbounded-text column per descriptor column.
pub fn create_table_sql(table: &TableDescriptor) -> String {
    let columns = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.kind.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({columns})", quote_identifier(&table.name))
}

/// `DROP TABLE IF EXISTS` statement.
pub fn drop_table_sql(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(name))
}

/// Ensure `table` exists according to `policy`, committing the DDL on success.
///
/// Any rejected statement is rolled back and returned as [`IngestionError::Schema`]. Under
/// [`ExistingTablePolicy::Replace`] the drop and the create commit together, so a rejected
/// create leaves the previous table in place.
pub fn materialize(
    session: &mut dyn DatabaseSession,
    table: &TableDescriptor,
    policy: ExistingTablePolicy,
) -> IngestionResult<MaterializeResult> {
    let result = apply(session, table, policy).and_then(|r| session.commit().map(|()| r));
    match result {
        Ok(r) => {
            info!(table = %table.name, result = ?r, "materialized table");
            Ok(r)
        }
        Err(source) => {
            let _ = session.rollback();
            Err(IngestionError::Schema {
                table: table.name.clone(),
                source,
            })
        }
    }
}

fn apply(
    session: &mut dyn DatabaseSession,
    table: &TableDescriptor,
    policy: ExistingTablePolicy,
) -> Result<MaterializeResult, SessionError> {
    match policy {
        ExistingTablePolicy::SkipIfExists => {
            if session.table_exists(&table.name)? {
                debug!(table = %table.name, "table exists, skipping");
                return Ok(MaterializeResult::Skipped);
            }
            session.execute(&create_table_sql(table), &[])?;
            Ok(MaterializeResult::Created)
        }
        ExistingTablePolicy::Replace => {
            session.execute(&drop_table_sql(&table.name), &[])?;
            session.execute(&create_table_sql(table), &[])?;
            Ok(MaterializeResult::Replaced)
        }
    }
}

use serde::Serialize;

use super::loader::InsertDiscipline;
use super::materialize::ExistingTablePolicy;
use crate::naming::NamingPolicy;

/// How one document is loaded: naming, existing-table handling, insert discipline and
/// blank-row filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadStrategy {
    /// Table naming policy.
    pub naming: NamingPolicy,
    /// What to do when a table already exists.
    pub existing: ExistingTablePolicy,
    /// How rows are submitted.
    pub discipline: InsertDiscipline,
    /// Drop all-null rows before loading.
    pub drop_blank_rows: bool,
}

impl LoadStrategy {
    /// Names from the file (and sheet), skip existing tables, insert row by row, drop blank rows.
    pub fn file_derived() -> Self {
        Self {
            naming: NamingPolicy::FileDerived,
            existing: ExistingTablePolicy::SkipIfExists,
            discipline: InsertDiscipline::FaultIsolated,
            drop_blank_rows: true,
        }
    }

    /// Names from `prefix` and sheet, replace existing tables, insert each sheet as one batch.
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            naming: NamingPolicy::Prefixed(prefix.into()),
            existing: ExistingTablePolicy::Replace,
            discipline: InsertDiscipline::Batched,
            drop_blank_rows: false,
        }
    }
}

impl Default for LoadStrategy {
    fn default() -> Self {
        Self::file_derived()
    }
}

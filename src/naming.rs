//! Destination table naming.
//!
//! Table names depend only on the origin file name, the sheet name and an optional prefix,
//! never on sheet contents. Two policies exist:
//!
//! - **File-derived**: `{stem}` or `{stem}_{sheet}`, where `stem` is the origin's file name
//!   without directory or extension.
//! - **Prefix-derived**: `{prefix}__{sheet}`.
//!
//! In both cases spaces and hyphens are replaced by underscores. No uniqueness check is made.

use std::path::Path;

use serde::Serialize;

/// Which naming policy to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NamingPolicy {
    /// Derive the name from the origin file name (and sheet name for workbooks).
    FileDerived,
    /// Derive the name from a caller-supplied prefix and the sheet name.
    Prefixed(String),
}

impl NamingPolicy {
    /// Table name for `sheet_name` of `origin` under this policy.
    pub fn table_name(&self, origin: &str, sheet_name: Option<&str>) -> String {
        match self {
            Self::FileDerived => derive_table_name(origin, sheet_name, None),
            Self::Prefixed(prefix) => derive_table_name(origin, sheet_name, Some(prefix)),
        }
    }

    /// The prefix, when prefix-derived.
    pub fn prefix(&self) -> Option<&str> {
        match self {
            Self::FileDerived => None,
            Self::Prefixed(p) => Some(p.as_str()),
        }
    }
}

/// Derive a destination table name.
///
/// With a `prefix` the result is `{prefix}__{sheet_name}`; otherwise it is the file stem of
/// `origin`, suffixed with `_{sheet_name}` when a sheet name is given. Empty inputs give a
/// degenerate but well-defined name (e.g. `CustomTable__` for an empty sheet name).
pub fn derive_table_name(origin: &str, sheet_name: Option<&str>, prefix: Option<&str>) -> String {
    let raw = match (prefix, sheet_name) {
        (Some(prefix), sheet) => format!("{prefix}__{}", sheet.unwrap_or_default()),
        (None, Some(sheet)) => format!("{}_{sheet}", file_stem(origin)),
        (None, None) => file_stem(origin).to_string(),
    };
    sanitize(&raw)
}

fn file_stem(origin: &str) -> &str {
    Path::new(origin)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(origin)
}

fn sanitize(raw: &str) -> String {
    raw.replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_derived_csv_uses_stem_only() {
        assert_eq!(
            derive_table_name("downloads/Monthly Sales-2024.csv", None, None),
            "Monthly_Sales_2024"
        );
    }

    #[test]
    fn file_derived_workbook_appends_sheet() {
        assert_eq!(
            derive_table_name("Sales-Report.xlsx", Some("Q1 North"), None),
            "Sales_Report_Q1_North"
        );
    }

    #[test]
    fn prefix_derived_ignores_origin() {
        assert_eq!(
            derive_table_name("Sales-Report.xlsx", Some("Q1"), Some("CustomTable")),
            "CustomTable__Q1"
        );
        assert_eq!(
            derive_table_name("other.xlsx", Some("East-West Sheet"), Some("My Prefix")),
            "My_Prefix__East_West_Sheet"
        );
    }

    #[test]
    fn degenerate_inputs_are_defined() {
        assert_eq!(derive_table_name("", Some("Q1"), None), "_Q1");
        assert_eq!(derive_table_name("book.xlsx", Some(""), None), "book_");
        assert_eq!(derive_table_name("book.xlsx", None, Some("P")), "P__");
    }

    #[test]
    fn naming_is_deterministic() {
        let policy = NamingPolicy::Prefixed("CustomTable".to_string());
        let a = policy.table_name("x.xlsx", Some("Q2"));
        let b = policy.table_name("x.xlsx", Some("Q2"));
        assert_eq!(a, b);
        assert_eq!(policy.prefix(), Some("CustomTable"));
        assert_eq!(NamingPolicy::FileDerived.prefix(), None);
    }
}

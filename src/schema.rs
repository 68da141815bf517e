//! Schema projection: sheet headers to destination columns.

use crate::types::{Column, Sheet, TableDescriptor, is_blank_row};

/// Normalize a header: trim surrounding whitespace, then replace inner spaces with `_`.
///
/// Does not deduplicate or validate identifiers; an illegal result surfaces later as a
/// schema error from the database.
pub fn normalize_column_name(header: &str) -> String {
    header.trim().replace(' ', "_")
}

/// Project the columns of `sheet`, all typed as unbounded text.
pub fn project_schema(sheet: &Sheet) -> Vec<Column> {
    sheet
        .headers
        .iter()
        .map(|h| Column::text(normalize_column_name(h)))
        .collect()
}

/// Build the full descriptor for `sheet` loaded into `table_name`.
pub fn describe_table(table_name: impl Into<String>, sheet: &Sheet) -> TableDescriptor {
    TableDescriptor::new(table_name, project_schema(sheet))
}

/// Drop rows whose cells are all null.
pub fn drop_blank_rows(sheet: &Sheet) -> Sheet {
    sheet.filter_rows(|row| !is_blank_row(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StorageKind, Value};

    fn sheet() -> Sheet {
        Sheet::new(
            "Q1",
            vec![
                "  Order Id ".to_string(),
                "Customer Full Name".to_string(),
                "total".to_string(),
            ],
            vec![
                vec![Value::Int64(1), Value::Utf8("Ada".to_string()), Value::Float64(9.5)],
                vec![Value::Null, Value::Null, Value::Null],
            ],
        )
    }

    #[test]
    fn headers_are_trimmed_and_underscored() {
        let cols = project_schema(&sheet());
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Order_Id", "Customer_Full_Name", "total"]);
        assert!(cols.iter().all(|c| c.kind == StorageKind::UnboundedText));
    }

    #[test]
    fn duplicates_are_not_deduplicated() {
        let s = Sheet::new("s", vec!["a b".to_string(), "a_b".to_string()], vec![]);
        let desc = describe_table("t", &s);
        assert_eq!(desc.column_names().collect::<Vec<_>>(), vec!["a_b", "a_b"]);
    }

    #[test]
    fn blank_rows_do_not_survive() {
        let out = drop_blank_rows(&sheet());
        assert_eq!(out.row_count(), 1);
        assert_eq!(project_schema(&out), project_schema(&sheet()));
    }
}

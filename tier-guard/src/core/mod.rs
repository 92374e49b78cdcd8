//! Core data model: cell values, rows, and group keys.
//!
//! A dataset is a `Vec<Row>` held in memory for the duration of one profiling
//! run. Rows are never mutated by the pipeline; every stage produces new rows.

pub mod cancel;
pub mod group_key;
pub mod row;
pub mod value;

pub use cancel::CancellationToken;
pub use group_key::{GroupKey, GroupKeyIndex, KeyMatch, KEY_SEPARATOR};
pub use row::Row;
pub use value::{format_number, Value};

/// Returns the column names of a dataset, discovered from its first row.
pub fn column_names(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.field_names().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Extracts the finite numeric values of `field` using lenient coercion.
///
/// Rows where the field is missing or not numeric are skipped.
pub fn numeric_column(rows: &[Row], field: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| row.get(field).and_then(Value::to_number_lenient))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_column_names_from_first_row() {
        let rows = vec![row! { "a" => 1, "b" => 2 }, row! { "c" => 3 }];
        assert_eq!(column_names(&rows), vec!["a", "b"]);
        assert!(column_names(&[]).is_empty());
    }

    #[test]
    fn test_numeric_column_skips_non_numeric() {
        let rows = vec![
            row! { "v" => 1 },
            row! { "v" => "2.5" },
            row! { "v" => "n/a" },
            row! { "w" => 9 },
        ];
        assert_eq!(numeric_column(&rows, "v"), vec![1.0, 2.5]);
    }
}

//! Row-oriented intermediate tables.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Column name of the single cell produced for scalar results.
pub const RESULT_COLUMN: &str = "result";

/// A row-oriented table whose rows need not share the same keys.
///
/// `columns` holds every name seen in any row, sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTable {
    columns: BTreeSet<String>,
    rows: Vec<Map<String, Value>>,
}

impl ColumnTable {
    /// Builds a table from rows, discovering the column universe first.
    pub fn from_rows(rows: Vec<Map<String, Value>>) -> Self {
        let columns = rows.iter().flat_map(|row| row.keys().cloned()).collect();
        Self { columns, rows }
    }

    /// Keeps every mapping element of a sequence as a row, dropping the rest.
    pub fn from_sequence(values: &[Value]) -> Self {
        let rows = values
            .iter()
            .filter_map(|value| value.as_object().cloned())
            .collect();
        Self::from_rows(rows)
    }

    /// A one-row, one-column table holding a scalar under `result`.
    pub fn scalar(value: Value) -> Self {
        let mut row = Map::new();
        row.insert(RESULT_COLUMN.to_string(), value);
        Self::from_rows(vec![row])
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }
}

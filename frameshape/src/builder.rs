//! Row table to frame conversion.

use crate::coercion::coerce_numeric;
use crate::frame::{Column, Field, Frame};
use crate::table::ColumnTable;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Field that is placed right after the timestamp field.
pub const ID_COLUMN: &str = "id";

/// Builds a column-oriented frame from a row table.
///
/// Every discovered column becomes one field with one cell per row. The
/// `timestamp_key` column is parsed as RFC 3339 time, every other column goes
/// through numeric coercion. Fields are ordered timestamp, `id`, then the
/// rest by name.
pub fn build_frame(name: &str, table: &ColumnTable, timestamp_key: &str) -> Frame {
    let mut raw: BTreeMap<String, Vec<String>> = table
        .column_names()
        .map(|column| (column.to_string(), render_column(table, column)))
        .collect();

    let mut fields = Vec::with_capacity(raw.len());

    if let Some(cells) = raw.remove(timestamp_key) {
        fields.push(Field::new(timestamp_key, parse_timestamps(timestamp_key, &cells)));
    }

    if let Some(cells) = raw.remove(ID_COLUMN) {
        fields.push(Field::new(ID_COLUMN, coerce_numeric(Column::Text(cells))));
    }

    for (column, cells) in raw {
        fields.push(Field::new(column, coerce_numeric(Column::Text(cells))));
    }

    Frame::with_fields(name, fields)
}

fn render_column(table: &ColumnTable, column: &str) -> Vec<String> {
    table
        .rows()
        .iter()
        .map(|row| row.get(column).map(render_cell).unwrap_or_default())
        .collect()
}

/// JSON text of a cell, with the quotes of a string literal removed.
fn render_cell(cell: &Value) -> String {
    match serde_json::to_string(cell) {
        Ok(encoded) => strip_quotes(encoded),
        Err(_) => format!("< {} >", cell),
    }
}

fn strip_quotes(encoded: String) -> String {
    if encoded.len() >= 2 && encoded.starts_with('"') && encoded.ends_with('"') {
        encoded[1..encoded.len() - 1].to_string()
    } else {
        encoded
    }
}

fn parse_timestamps(column: &str, cells: &[String]) -> Column {
    let times = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match DateTime::parse_from_rfc3339(cell) {
            Ok(time) => Some(time.with_timezone(&Utc)),
            Err(error) => {
                warn!(column, row, cell = %cell, %error, "unparseable timestamp, using null");
                None
            }
        })
        .collect();
    Column::Time(times)
}

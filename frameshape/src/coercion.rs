//! Best-effort conversion of text columns into numeric columns.

use crate::frame::Column;

/// Literal cell text that stands for a missing number.
const NULL_LITERAL: &str = "null";

/// Reinterprets a text column as nullable floats.
///
/// Conversion is all-or-nothing: if any cell other than `null` fails to
/// parse, the column comes back unchanged. Empty and non-text columns are
/// returned as they are.
pub fn coerce_numeric(column: Column) -> Column {
    let cells = match column {
        Column::Text(cells) if !cells.is_empty() => cells,
        other => return other,
    };

    match parse_cells(&cells) {
        Some(numbers) => Column::Number(numbers),
        None => Column::Text(cells),
    }
}

fn parse_cells(cells: &[String]) -> Option<Vec<Option<f64>>> {
    cells
        .iter()
        .map(|cell| {
            if cell == NULL_LITERAL {
                Some(None)
            } else {
                cell.parse::<f64>().ok().map(Some)
            }
        })
        .collect()
}

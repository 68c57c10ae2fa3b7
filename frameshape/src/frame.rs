//! Column-oriented frames.
//!
//! A [`Frame`] is the output unit of every stage: a name plus an ordered list
//! of equally long, homogeneously typed [`Field`]s.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// The cells of a single field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum Column {
    /// Raw text cells, left as-is when numeric coercion fails
    Text(Vec<String>),
    /// Nullable 64-bit floats
    Number(Vec<Option<f64>>),
    /// Nullable UTC timestamps
    Time(Vec<Option<DateTime<Utc>>>),
    /// Nullable signed counters
    Count(Vec<Option<i64>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(cells) => cells.len(),
            Column::Number(cells) => cells.len(),
            Column::Time(cells) => cells.len(),
            Column::Count(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the cell type, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Text(_) => "text",
            Column::Number(_) => "number",
            Column::Time(_) => "time",
            Column::Count(_) => "count",
        }
    }

    /// Textual form of the cell at `index`.
    ///
    /// Null cells render as `null`, timestamps as RFC 3339 with nanoseconds.
    /// Returns `None` when `index` is out of bounds.
    pub fn cell_text(&self, index: usize) -> Option<String> {
        let text = match self {
            Column::Text(cells) => cells.get(index)?.clone(),
            Column::Number(cells) => match cells.get(index)? {
                Some(value) => value.to_string(),
                None => "null".to_string(),
            },
            Column::Time(cells) => match cells.get(index)? {
                Some(time) => time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                None => "null".to_string(),
            },
            Column::Count(cells) => match cells.get(index)? {
                Some(count) => count.to_string(),
                None => "null".to_string(),
            },
        };
        Some(text)
    }

    /// Cells at `indices`, in that order, as a column of the same type.
    ///
    /// Indices past the end are skipped.
    pub fn take(&self, indices: &[usize]) -> Column {
        fn pick<T: Clone>(cells: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().filter_map(|&index| cells.get(index).cloned()).collect()
        }

        match self {
            Column::Text(cells) => Column::Text(pick(cells, indices)),
            Column::Number(cells) => Column::Number(pick(cells, indices)),
            Column::Time(cells) => Column::Time(pick(cells, indices)),
            Column::Count(cells) => Column::Count(pick(cells, indices)),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub column: Column,
}

impl Field {
    pub fn new(name: impl Into<String>, column: Column) -> Self {
        Self {
            name: name.into(),
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }
}

/// Visualization the host should prefer for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisType {
    Table,
    Logs,
    Graph,
}

/// Metadata attached to frames handed back to the host.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_visualization: Option<VisType>,
    /// Free-form diagnostics supplied by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
}

/// A named, column-oriented table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<FrameMeta>,
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            meta: None,
        }
    }

    pub fn with_fields(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            meta: None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    /// Number of rows, taken from the first field.
    pub fn row_count(&self) -> usize {
        self.fields.first().map_or(0, Field::len)
    }
}

//! Metric mode: reduce a frame to its time, value and group fields.

use crate::error::{FieldRole, FrameError};
use crate::frame::{Column, Field, Frame};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Names of the fields metric mode works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricColumns {
    pub time: String,
    pub value: String,
    pub group_by: String,
    /// Whether the group field is required and kept
    pub group: bool,
}

impl Default for MetricColumns {
    fn default() -> Self {
        Self {
            time: "timestamp".to_string(),
            value: "value".to_string(),
            group_by: "group".to_string(),
            group: false,
        }
    }
}

/// A time/value series, optionally still carrying its group field.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeValueSeries {
    pub name: String,
    pub time_name: String,
    pub time: Vec<Option<DateTime<Utc>>>,
    pub value_name: String,
    /// Value cells as they came out of the result, not yet required to be numeric
    pub value: Column,
    pub group: Option<Field>,
}

impl TimeValueSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Converts back into a frame with fields `[time, value]` (plus group).
    pub fn into_frame(self) -> Frame {
        let mut fields = vec![
            Field::new(self.time_name, Column::Time(self.time)),
            Field::new(self.value_name, self.value),
        ];
        if let Some(group) = self.group {
            fields.push(group);
        }
        Frame::with_fields(self.name, fields)
    }
}

/// Extracts the metric series from the single frame of a result.
pub fn extract_series(frames: Vec<Frame>, columns: &MetricColumns) -> Result<TimeValueSeries, FrameError> {
    if frames.len() != 1 {
        return Err(FrameError::MultipleFramesUnsupported {
            count: frames.len(),
        });
    }
    let Some(frame) = frames.into_iter().next() else {
        return Err(FrameError::MultipleFramesUnsupported { count: 0 });
    };

    let available = frame.field_names().join(", ");
    let empty = frame.fields.is_empty();

    let mut time_field = None;
    let mut value_field = None;
    let mut group_field = None;

    for field in frame.fields {
        if field.name == columns.time {
            time_field = Some(field);
        } else if field.name == columns.value {
            value_field = Some(field);
        } else if field.name == columns.group_by {
            group_field = Some(field);
        }
    }

    if empty {
        time_field = Some(Field::new(columns.time.as_str(), Column::Time(Vec::new())));
        value_field = Some(Field::new(columns.value.as_str(), Column::Number(Vec::new())));
    }

    let time_field = time_field.ok_or_else(|| missing(FieldRole::Time, &columns.time, &available))?;
    let value_field = value_field.ok_or_else(|| missing(FieldRole::Value, &columns.value, &available))?;
    let group = if columns.group {
        Some(group_field.ok_or_else(|| missing(FieldRole::Group, &columns.group_by, &available))?)
    } else {
        None
    };

    let time = match time_field.column {
        Column::Time(cells) => cells,
        other => return Err(mismatch(FieldRole::Time, time_field.name, "time", &other)),
    };

    debug!(
        name = %frame.name,
        rows = time.len(),
        value = value_field.column.kind(),
        grouped = group.is_some(),
        "extracted metric series"
    );

    Ok(TimeValueSeries {
        name: frame.name,
        time_name: time_field.name,
        time,
        value_name: value_field.name,
        value: value_field.column,
        group,
    })
}

fn missing(role: FieldRole, name: &str, available: &str) -> FrameError {
    FrameError::MissingField {
        role,
        name: name.to_string(),
        available: available.to_string(),
    }
}

fn mismatch(role: FieldRole, name: String, expected: &'static str, found: &Column) -> FrameError {
    FrameError::FieldTypeMismatch {
        role,
        name,
        expected,
        found: found.kind(),
    }
}

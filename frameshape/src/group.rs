//! Splitting a grouped series into one series per group key.

use crate::error::{FieldRole, FrameError};
use crate::metric::TimeValueSeries;
use std::collections::HashMap;
use tracing::debug;

/// Partitions a series by the text of its group cells.
///
/// Each output series is named after its key and keeps the input's row order
/// for that key, and the value cells keep their type. The order of the
/// returned series is unspecified.
pub fn split_groups(series: TimeValueSeries) -> Result<Vec<TimeValueSeries>, FrameError> {
    let Some(group) = series.group else {
        return Err(FrameError::MissingField {
            role: FieldRole::Group,
            name: String::new(),
            available: format!("{}, {}", series.time_name, series.value_name),
        });
    };

    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    let rows = group.len().min(series.time.len()).min(series.value.len());

    for index in 0..rows {
        let Some(key) = group.column.cell_text(index) else {
            break;
        };
        groups.entry(key).or_default().push(index);
    }

    debug!(name = %series.name, groups = groups.len(), rows, "split series by group");

    Ok(groups
        .into_iter()
        .map(|(key, rows)| TimeValueSeries {
            name: key,
            time_name: series.time_name.clone(),
            time: rows.iter().map(|&index| series.time[index]).collect(),
            value_name: series.value_name.clone(),
            value: series.value.take(&rows),
            group: None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Column, Field};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(minute: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap())
    }

    fn series(keys: Column) -> TimeValueSeries {
        let rows = keys.len();
        TimeValueSeries {
            name: "A".to_string(),
            time_name: "timestamp".to_string(),
            time: (0..rows as u32).map(at).collect(),
            value_name: "value".to_string(),
            value: Column::Number((0..rows).map(|v| Some(v as f64)).collect()),
            group: Some(Field::new("group", keys)),
        }
    }

    #[test]
    fn test_groups_preserve_row_order_and_cover_input() {
        let keys = ["a", "b", "a", "c", "b", "a"];
        let input = series(Column::Text(keys.iter().map(|k| k.to_string()).collect()));
        let expected_pairs: Vec<_> = input.time.iter().cloned().zip(numbers(&input.value)).collect();

        let mut output = split_groups(input).unwrap();
        output.sort_by(|a, b| a.name.cmp(&b.name));

        let names: Vec<_> = output.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(output[0].value, Column::Number(vec![Some(0.0), Some(2.0), Some(5.0)]));
        assert_eq!(output[1].value, Column::Number(vec![Some(1.0), Some(4.0)]));
        assert_eq!(output[2].time, vec![at(3)]);
        assert!(output.iter().all(|s| s.group.is_none()));

        let mut union: Vec<_> = output
            .iter()
            .flat_map(|s| s.time.iter().cloned().zip(numbers(&s.value)))
            .collect();
        union.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(union, expected_pairs);
    }

    fn numbers(column: &Column) -> Vec<Option<f64>> {
        match column {
            Column::Number(cells) => cells.clone(),
            other => panic!("expected number cells, got {}", other.kind()),
        }
    }

    #[test]
    fn test_text_values_keep_their_type() {
        let mut input = series(Column::Text(vec!["a".to_string(), "b".to_string(), "a".to_string()]));
        input.value = Column::Text(vec!["1".to_string(), String::new(), "3".to_string()]);

        let mut output = split_groups(input).unwrap();
        output.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(output[0].value, Column::Text(vec!["1".to_string(), "3".to_string()]));
        assert_eq!(output[1].value, Column::Text(vec![String::new()]));
    }

    #[test]
    fn test_numeric_and_null_keys_use_text_form() {
        let input = series(Column::Number(vec![Some(1.0), None, Some(1.0)]));
        let mut output = split_groups(input).unwrap();
        output.sort_by(|a, b| a.name.cmp(&b.name));

        let names: Vec<_> = output.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["1", "null"]);
        assert_eq!(output[0].len(), 2);
    }

    #[test]
    fn test_empty_series_has_no_groups() {
        let output = split_groups(series(Column::Text(Vec::new()))).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_series_without_group_is_rejected() {
        let mut input = series(Column::Text(vec!["a".to_string()]));
        input.group = None;
        assert!(matches!(
            split_groups(input),
            Err(FrameError::MissingField { role: FieldRole::Group, .. })
        ));
    }
}

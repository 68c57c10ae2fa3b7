//! Recursive normalization of query results into frames.

use crate::builder::build_frame;
use crate::error::FrameError;
use crate::frame::Frame;
use crate::table::ColumnTable;
use serde_json::Value;
use tracing::debug;

/// Turns a decoded query result into named frames.
///
/// Scalars become one-cell frames, sequences become row tables and mappings
/// are treated as namespaces whose entries are normalized under
/// `name:key`. Booleans are rejected.
pub fn normalize(name: &str, result: &Value, timestamp_key: &str) -> Result<Vec<Frame>, FrameError> {
    let mut frames = Vec::new();
    process(name, result, timestamp_key, &mut frames)?;
    debug!(name, frames = frames.len(), "normalized query result");
    Ok(frames)
}

fn process(
    name: &str,
    result: &Value,
    timestamp_key: &str,
    frames: &mut Vec<Frame>,
) -> Result<(), FrameError> {
    match result {
        Value::Null => {
            let table = ColumnTable::scalar(Value::String("null".to_string()));
            frames.push(build_frame(name, &table, timestamp_key));
        }
        Value::String(_) | Value::Number(_) => {
            let table = ColumnTable::scalar(result.clone());
            frames.push(build_frame(name, &table, timestamp_key));
        }
        Value::Array(values) => {
            let table = ColumnTable::from_sequence(values);
            frames.push(build_frame(name, &table, timestamp_key));
        }
        Value::Object(entries) => {
            for (key, entry) in entries {
                process(&format!("{}:{}", name, key), entry, timestamp_key, frames)?;
            }
        }
        Value::Bool(_) => {
            return Err(FrameError::UnsupportedResultType {
                name: name.to_string(),
                kind: "bool",
            });
        }
    }
    Ok(())
}

//! Validation of the raw database response.

use serde_json::Value;
use thiserror::Error;

/// Ways the database response can fail to have the expected shape.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShapeError {
    #[error("invalid queryResponse type, expected an array")]
    NotSequence,
    #[error("invalid queryResponse length")]
    Empty,
    #[error("invalid queryResponse array type")]
    NotMapping,
    #[error("invalid queryResponse status")]
    MissingStatus,
    #[error("invalid queryResponse time")]
    MissingTime,
    #[error("invalid queryResponse data")]
    MissingResult,
}

/// The first statement result of a database response.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub status: Value,
    pub time: Value,
    pub result: Value,
}

impl QueryResponse {
    /// `status` as plain text, strings unquoted.
    pub fn status_text(&self) -> String {
        plain_text(&self.status)
    }

    /// `time` as plain text, strings unquoted.
    pub fn time_text(&self) -> String {
        plain_text(&self.time)
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl TryFrom<Value> for QueryResponse {
    type Error = ResponseShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Array(statements) = value else {
            return Err(ResponseShapeError::NotSequence);
        };
        let Some(first) = statements.into_iter().next() else {
            return Err(ResponseShapeError::Empty);
        };
        let Value::Object(mut first) = first else {
            return Err(ResponseShapeError::NotMapping);
        };

        let status = first.remove("status").ok_or(ResponseShapeError::MissingStatus)?;
        let time = first.remove("time").ok_or(ResponseShapeError::MissingTime)?;
        let result = first.remove("result").ok_or(ResponseShapeError::MissingResult)?;

        Ok(Self { status, time, result })
    }
}

//! Error types for the shaping and aggregation stages.

use std::fmt::{Display, Formatter};
use thiserror::Error;

/// The role a field plays in metric mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// The time axis of a series
    Time,
    /// The sampled values of a series
    Value,
    /// The categorical column a series is split by
    Group,
}

impl Display for FieldRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldRole::Time => write!(f, "time field"),
            FieldRole::Value => write!(f, "data field"),
            FieldRole::Group => write!(f, "group by"),
        }
    }
}

/// Errors raised while shaping a query result or aggregating a series.
#[derive(Error, Debug)]
pub enum FrameError {
    /// The result value has a shape the normalizer cannot turn into frames.
    #[error("not supported query result type '{kind}' in '{name}'")]
    UnsupportedResultType { name: String, kind: &'static str },

    /// Metric processing needs exactly one frame.
    #[error("multiple frames are not supported yet (got {count})")]
    MultipleFramesUnsupported { count: usize },

    /// A named field could not be located in the frame.
    #[error("{role} '{name}' not found in data frame, available are: {available}")]
    MissingField {
        role: FieldRole,
        name: String,
        available: String,
    },

    /// A field was found but holds the wrong kind of cells.
    #[error("{role} '{name}' has {found} cells, expected {expected}")]
    FieldTypeMismatch {
        role: FieldRole,
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A rate statistic outside the supported vocabulary.
    #[error("unsupported rate function '{0}'")]
    UnsupportedRateFunction(String),

    /// The rate interval could not be used for bucketing.
    #[error("invalid interval '{interval}': {reason}")]
    InvalidRateInterval { interval: String, reason: String },

    /// Frame metadata could not be rendered as JSON.
    #[error("frame metadata: {0}")]
    Meta(#[from] serde_json::Error),

    /// Arrow rejected a frame during encoding.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),
}

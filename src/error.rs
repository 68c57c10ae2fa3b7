//! Per-query errors, prefixed by the stage that failed.

use crate::query::UnsupportedQueryMode;
use crate::response::ResponseShapeError;
use frameshape_core::FrameError;
use thiserror::Error;

/// Error type returned by the query executor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DatasourceError {
    #[error("Query json: {0}")]
    RequestJson(#[from] serde_json::Error),

    #[error("Query mode: {0}")]
    QueryMode(#[from] UnsupportedQueryMode),

    #[error("Query failed: {0}")]
    Execution(BoxError),

    #[error("Query failed: {0}")]
    ResponseShape(#[from] ResponseShapeError),

    #[error("Result failed: {0}")]
    Result(#[source] FrameError),

    #[error("Metric failed: {0}")]
    Metric(#[source] FrameError),

    #[error("Group failed: {0}")]
    Group(#[source] FrameError),

    #[error("Rate failed: {0}")]
    Rate(#[source] FrameError),
}

//! The per-query pipeline.
//!
//! A query runs through: options decoding, placeholder substitution,
//! execution, response validation, normalization and, in metric mode,
//! series extraction, grouping and rate aggregation. Every produced frame
//! carries the same metadata.

use crate::config::QueryDefaults;
use crate::error::{BoxError, DatasourceError};
use crate::query::{QueryMode, QueryRequest, QueryWindow, TimeRange};
use crate::response::QueryResponse;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use frameshape_core::{
    aggregate, extract_series, normalize, split_groups, Frame, FrameMeta, TimeValueSeries,
};
use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Runs query text against the database.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn query(&self, surql: &str) -> Result<Value, BoxError>;
}

/// Answers every query with the same recorded response.
#[derive(Debug, Clone)]
pub struct RecordedExecutor {
    response: Value,
}

impl RecordedExecutor {
    pub fn new(response: Value) -> Self {
        Self { response }
    }
}

#[async_trait]
impl QueryExecutor for RecordedExecutor {
    async fn query(&self, surql: &str) -> Result<Value, BoxError> {
        debug!(surql, "replaying recorded response");
        Ok(self.response.clone())
    }
}

/// One query of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    pub ref_id: String,
    /// Raw query options JSON
    pub json: String,
    pub time_range: TimeRange,
    /// Interval suggested by the host for the range
    pub interval: TimeDelta,
}

/// Frames of one query, or why it failed.
pub type DataResponse = Result<Vec<Frame>, DatasourceError>;

/// Results of a batch, keyed by ref id.
#[derive(Debug, Default)]
pub struct QueryDataResponse {
    pub responses: BTreeMap<String, DataResponse>,
}

pub struct Datasource {
    executor: Box<dyn QueryExecutor>,
    defaults: QueryDefaults,
}

impl Datasource {
    pub fn new(executor: Box<dyn QueryExecutor>, defaults: QueryDefaults) -> Self {
        Self { executor, defaults }
    }

    /// Runs a batch. Queries are independent; one failing does not affect
    /// the others.
    pub async fn query_data(&self, queries: &[DataQuery]) -> QueryDataResponse {
        let now = Utc::now();
        let results = join_all(queries.iter().map(|query| async move {
            let result = self.query_at(query, now).await;
            if let Err(e) = &result {
                error!(ref_id = %query.ref_id, error = %e, "query failed");
            }
            (query.ref_id.clone(), result)
        }))
        .await;

        QueryDataResponse {
            responses: results.into_iter().collect(),
        }
    }

    /// Runs a single query with `now` as the value of `$now`.
    pub async fn query_at(&self, query: &DataQuery, now: DateTime<Utc>) -> DataResponse {
        let mut request: QueryRequest = serde_json::from_str(&query.json)?;
        if request.hide {
            debug!(ref_id = %query.ref_id, "query hidden");
            return Ok(Vec::new());
        }

        let mode: QueryMode = request.mode.parse()?;
        request.apply_defaults(&self.defaults);

        let window = QueryWindow::new(now, query.time_range, query.interval);
        let surql = window.substitute(&request.surql);

        info!(ref_id = %query.ref_id, %mode, "running query");
        let value = self.executor.query(&surql).await.map_err(DatasourceError::Execution)?;
        let response = QueryResponse::try_from(value)?;

        let meta = FrameMeta {
            preferred_visualization: Some(mode.preferred_visualization()),
            custom: Some(json!({
                "queryRaw": request.surql.as_str(),
                "queryRun": surql.as_str(),
                "status": response.status_text(),
                "time": response.time_text(),
            })),
        };

        let mut frames = normalize(&query.ref_id, &response.result, &request.timestamp)
            .map_err(DatasourceError::Result)?;

        if mode == QueryMode::Metric {
            let series = extract_series(frames, &request.metric_columns()).map_err(DatasourceError::Metric)?;

            let series = if request.group {
                split_groups(series).map_err(DatasourceError::Group)?
            } else {
                vec![series]
            };

            frames = if request.rate {
                let options = window.rate_options(&request);
                series
                    .iter()
                    .map(|series| aggregate(series, &options))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(DatasourceError::Rate)?
            } else {
                series.into_iter().map(TimeValueSeries::into_frame).collect()
            };
        }

        for frame in &mut frames {
            frame.meta = Some(meta.clone());
        }

        debug!(ref_id = %query.ref_id, frames = frames.len(), "query finished");
        Ok(frames)
    }
}

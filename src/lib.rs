//! SurrealDB datasource backend.
//!
//! Turns per-query options from a dashboard host into query text, runs it
//! through a [`QueryExecutor`], and shapes the response into frames with
//! [`frameshape_core`]: raw tables, log tables, or metric series that can be
//! grouped and rate aggregated.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use serde_json::json;
//! use surreal_datasource::{DataQuery, Datasource, QueryDefaults, RecordedExecutor, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Replay a recorded response instead of talking to a database
//!     let executor = RecordedExecutor::new(json!([{
//!         "status": "OK",
//!         "time": "1ms",
//!         "result": [{"timestamp": "2024-01-01T00:00:10Z", "value": 3}],
//!     }]));
//!     let datasource = Datasource::new(Box::new(executor), QueryDefaults::default());
//!
//!     let query = DataQuery {
//!         ref_id: "A".to_string(),
//!         json: r#"{"mode":"metric","rate":true,"rateFunctions":["count"]}"#.to_string(),
//!         time_range: TimeRange {
//!             from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//!             to: Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap(),
//!         },
//!         interval: TimeDelta::minutes(1),
//!     };
//!
//!     let response = datasource.query_data(&[query]).await;
//!     for (ref_id, result) in &response.responses {
//!         match result {
//!             Ok(frames) => println!("{ref_id}: {} frames", frames.len()),
//!             Err(e) => println!("{ref_id}: {e}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod datasource;
pub mod error;
pub mod query;
pub mod response;

#[cfg(test)]
mod tests;

pub use config::{ConnectionSettings, QueryDefaults, Settings};
pub use datasource::{
    DataQuery, DataResponse, Datasource, QueryDataResponse, QueryExecutor, RecordedExecutor,
};
pub use error::{BoxError, DatasourceError};
pub use query::{QueryMode, QueryRequest, QueryWindow, TimeRange};
pub use response::{QueryResponse, ResponseShapeError};

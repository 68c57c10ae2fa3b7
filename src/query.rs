//! Per-query options and placeholder substitution.

use crate::config::QueryDefaults;
use chrono::{DateTime, TimeDelta, Utc};
use frameshape_core::{format_interval, MetricColumns, RateOptions, VisType};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// How a query result is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Tables as returned
    Raw,
    /// Log lines
    Log,
    /// Time series, optionally grouped and rate aggregated
    Metric,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported query mode '{0}'")]
pub struct UnsupportedQueryMode(pub String);

impl QueryMode {
    pub fn preferred_visualization(self) -> VisType {
        match self {
            QueryMode::Raw => VisType::Table,
            QueryMode::Log => VisType::Logs,
            QueryMode::Metric => VisType::Graph,
        }
    }
}

impl FromStr for QueryMode {
    type Err = UnsupportedQueryMode;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "raw" => Ok(QueryMode::Raw),
            "log" => Ok(QueryMode::Log),
            "metric" => Ok(QueryMode::Metric),
            other => Err(UnsupportedQueryMode(other.to_string())),
        }
    }
}

impl Display for QueryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryMode::Raw => write!(f, "raw"),
            QueryMode::Log => write!(f, "log"),
            QueryMode::Metric => write!(f, "metric"),
        }
    }
}

/// Query options as sent by the host's query editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryRequest {
    /// Skip the query entirely
    pub hide: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub mode: String,
    #[serde(deserialize_with = "null_as_default")]
    pub surql: String,
    /// Re-run on refresh; handled by the host
    pub requery: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    /// Message column of log mode; handled by the host
    #[serde(deserialize_with = "null_as_default")]
    pub log_message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub metric_data: String,
    pub group: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub group_by: String,
    pub rate: bool,
    pub rate_zero: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub rate_interval: String,
    #[serde(deserialize_with = "null_as_default")]
    pub rate_functions: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl QueryRequest {
    /// Fills empty column names from the configured defaults.
    pub fn apply_defaults(&mut self, defaults: &QueryDefaults) {
        if self.timestamp.is_empty() {
            self.timestamp = defaults.timestamp.clone();
        }
        if self.metric_data.is_empty() {
            self.metric_data = defaults.metric_data.clone();
        }
        if self.group_by.is_empty() {
            self.group_by = defaults.group_by.clone();
        }
    }

    pub fn metric_columns(&self) -> MetricColumns {
        MetricColumns {
            time: self.timestamp.clone(),
            value: self.metric_data.clone(),
            group_by: self.group_by.clone(),
            group: self.group,
        }
    }
}

/// Time range selected in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// The instants and interval a query runs with.
///
/// The range is widened to whole seconds: `from` becomes one nanosecond
/// before its second, `to` the last nanosecond of its second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub now: DateTime<Utc>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub interval: TimeDelta,
}

fn floor_to_second(time: DateTime<Utc>) -> DateTime<Utc> {
    time - TimeDelta::nanoseconds(i64::from(time.timestamp_subsec_nanos()))
}

/// RFC 3339 with up to nine fraction digits, trailing zeros trimmed.
pub fn format_rfc3339_nano(time: DateTime<Utc>) -> String {
    let text = time.format("%Y-%m-%dT%H:%M:%S%.9f").to_string();
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text}Z")
}

impl QueryWindow {
    pub fn new(now: DateTime<Utc>, range: TimeRange, interval: TimeDelta) -> Self {
        let nanosecond = TimeDelta::nanoseconds(1);
        Self {
            now,
            from: floor_to_second(range.from) - nanosecond,
            to: floor_to_second(range.to) + TimeDelta::seconds(1) - nanosecond,
            interval,
        }
    }

    /// Replaces `$interval`, `$now`, `$from` and `$to` in query text.
    ///
    /// Instants are inserted as single-quoted string literals.
    pub fn substitute(&self, surql: &str) -> String {
        let quoted = |time| format!("'{}'", format_rfc3339_nano(time));
        surql
            .replace("$interval", &format_interval(self.interval))
            .replace("$now", &quoted(self.now))
            .replace("$from", &quoted(self.from))
            .replace("$to", &quoted(self.to))
    }

    /// Rate parameters of a request over this window.
    pub fn rate_options(&self, request: &QueryRequest) -> RateOptions {
        RateOptions {
            from: self.from,
            to: self.to,
            interval: self.interval,
            interval_override: Some(request.rate_interval.clone()).filter(|text| !text.is_empty()),
            zero_vector: request.rate_zero,
            functions: request.rate_functions.clone(),
        }
    }
}

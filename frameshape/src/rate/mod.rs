//! Fixed-interval rate aggregation of a time/value series.
//!
//! The aggregator walks the series once with a forward cursor, stepping a
//! bucket of width `interval` from `from` to `to` (both inclusive). A row
//! belongs to a bucket when `lower <= t <= lower + interval`; a row beyond
//! the upper bound is left for the next bucket. Rows with a null timestamp
//! are skipped.

pub mod stats;

use crate::error::{FieldRole, FrameError};
use crate::frame::{Column, Field, Frame};
use crate::interval::{format_interval, parse_interval};
use crate::metric::TimeValueSeries;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::debug;

/// Placeholder in an interval override that stands for the base interval.
pub const INTERVAL_PLACEHOLDER: &str = "$interval";

/// Statistics that can be derived per bucket.
///
/// The declaration order is the order of the output fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateFunction {
    Count,
    Sum,
    Absence,
    Average,
    Median,
    Quantile25,
    Quantile75,
    Quantile95,
    Quantile99,
    #[serde(rename = "stddev")]
    StdDev,
}

impl RateFunction {
    pub const ALL: [RateFunction; 10] = [
        RateFunction::Count,
        RateFunction::Sum,
        RateFunction::Absence,
        RateFunction::Average,
        RateFunction::Median,
        RateFunction::Quantile25,
        RateFunction::Quantile75,
        RateFunction::Quantile95,
        RateFunction::Quantile99,
        RateFunction::StdDev,
    ];

    /// Name of the function and of its output field.
    pub fn name(self) -> &'static str {
        match self {
            RateFunction::Count => "count",
            RateFunction::Sum => "sum",
            RateFunction::Absence => "absence",
            RateFunction::Average => "average",
            RateFunction::Median => "median",
            RateFunction::Quantile25 => "quantile25",
            RateFunction::Quantile75 => "quantile75",
            RateFunction::Quantile95 => "quantile95",
            RateFunction::Quantile99 => "quantile99",
            RateFunction::StdDev => "stddev",
        }
    }

    /// Value of the statistic for one bucket.
    pub fn evaluate(self, values: &[Option<f64>], zero_vector: bool) -> Option<f64> {
        match self {
            RateFunction::Count => {
                if values.is_empty() && !zero_vector {
                    None
                } else {
                    Some(values.len() as f64)
                }
            }
            RateFunction::Absence => stats::absence(values.len(), zero_vector),
            RateFunction::Sum => stats::sum(values, zero_vector),
            RateFunction::Average => stats::average(values, zero_vector),
            RateFunction::Median => stats::quantile(0.50, values, zero_vector),
            RateFunction::Quantile25 => stats::quantile(0.25, values, zero_vector),
            RateFunction::Quantile75 => stats::quantile(0.75, values, zero_vector),
            RateFunction::Quantile95 => stats::quantile(0.95, values, zero_vector),
            RateFunction::Quantile99 => stats::quantile(0.99, values, zero_vector),
            RateFunction::StdDev => stats::standard_deviation(values, zero_vector),
        }
    }
}

impl Display for RateFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RateFunction {
    type Err = FrameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        RateFunction::ALL
            .into_iter()
            .find(|function| function.name() == name)
            .ok_or_else(|| FrameError::UnsupportedRateFunction(name.to_string()))
    }
}

/// Parameters of one rate aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct RateOptions {
    /// First bucket lower bound
    pub from: DateTime<Utc>,
    /// Last possible bucket lower bound
    pub to: DateTime<Utc>,
    /// Base interval requested by the host
    pub interval: TimeDelta,
    /// Interval text replacing the base interval, may contain `$interval`
    pub interval_override: Option<String>,
    /// Report empty buckets as `0.0` instead of null
    pub zero_vector: bool,
    /// Requested statistic names
    pub functions: Vec<String>,
}

impl RateOptions {
    /// The bucket width after applying the override.
    pub fn bucket_interval(&self) -> Result<TimeDelta, FrameError> {
        let (text, interval) = match self.interval_override.as_deref() {
            Some(text) if !text.is_empty() => {
                let text = text.replace(INTERVAL_PLACEHOLDER, &format_interval(self.interval));
                let interval = parse_interval(&text).map_err(|error| FrameError::InvalidRateInterval {
                    interval: text.clone(),
                    reason: error.to_string(),
                })?;
                (text, interval)
            }
            _ => (format_interval(self.interval), self.interval),
        };

        if interval <= TimeDelta::zero() {
            return Err(FrameError::InvalidRateInterval {
                interval: text,
                reason: "interval must be positive".to_string(),
            });
        }
        Ok(interval)
    }

    /// The requested statistics in output order.
    pub fn rate_functions(&self) -> Result<BTreeSet<RateFunction>, FrameError> {
        self.functions.iter().map(|name| name.parse()).collect()
    }
}

/// Replaces a series by per-bucket statistics.
///
/// The result has the series' time field (bucket lower bounds) followed by
/// one field per requested statistic. The value field must hold numbers or
/// counts.
pub fn aggregate(series: &TimeValueSeries, options: &RateOptions) -> Result<Frame, FrameError> {
    let interval = options.bucket_interval()?;
    let functions = options.rate_functions()?;
    let samples = numeric_values(series)?;

    let rows = series.time.len().min(samples.len());
    let mut buckets: Vec<Option<DateTime<Utc>>> = Vec::new();
    let mut outputs: Vec<(RateFunction, Vec<Option<f64>>)> =
        functions.iter().map(|function| (*function, Vec::new())).collect();

    let mut index = 0;
    let mut lower = options.from;
    while lower <= options.to {
        let upper = lower.checked_add_signed(interval);
        let mut values = Vec::new();

        while index < rows {
            let time = series.time[index];
            let value = samples[index];
            index += 1;

            let Some(time) = time else {
                continue;
            };
            if time < lower {
                continue;
            }
            if upper.is_some_and(|upper| time > upper) {
                index -= 1;
                break;
            }
            values.push(value);
        }

        buckets.push(Some(lower));
        for (function, cells) in outputs.iter_mut() {
            cells.push(function.evaluate(&values, options.zero_vector));
        }

        match upper {
            Some(next) => lower = next,
            None => break,
        }
    }

    debug!(
        name = %series.name,
        rows,
        buckets = buckets.len(),
        interval = %format_interval(interval),
        "aggregated rate series"
    );

    let mut fields = vec![Field::new(series.time_name.as_str(), Column::Time(buckets))];
    for (function, cells) in outputs {
        let column = match function {
            RateFunction::Count => Column::Count(cells.into_iter().map(|cell| cell.map(|count| count as i64)).collect()),
            _ => Column::Number(cells),
        };
        fields.push(Field::new(function.name(), column));
    }

    Ok(Frame::with_fields(series.name.as_str(), fields))
}

fn numeric_values(series: &TimeValueSeries) -> Result<Vec<Option<f64>>, FrameError> {
    match &series.value {
        Column::Number(cells) => Ok(cells.clone()),
        Column::Count(cells) => Ok(cells.iter().map(|cell| cell.map(|count| count as f64)).collect()),
        other => Err(FrameError::FieldTypeMismatch {
            role: FieldRole::Value,
            name: series.value_name.clone(),
            expected: "number",
            found: other.kind(),
        }),
    }
}

/*!
# Frameshape: Result Shaping and Windowed Rate Aggregation for Time-Series Frames

Frameshape turns the loosely typed JSON returned by a document database into
column-oriented frames and derives fixed-interval statistics from them.

## Stages

### Normalization
- Scalars become a one-cell `result` frame
- Arrays of objects become tables with the union of their keys as columns
- Nested objects are flattened into one frame per leaf, named `parent:key`
- Columns are coerced to numbers when every cell parses as one

### Metric Extraction
- Reduces a single frame to its time and value fields
- Optionally keeps a group field and splits the series per group key

### Rate Aggregation
- Buckets a series into fixed intervals over a time range
- Count, sum, absence, average, median, quantiles and standard deviation
- Zero-vector mode reports empty buckets as `0.0` instead of null

### Arrow Encoding
- One record batch per frame, shipped as an Arrow IPC stream

## Usage

```rust
use chrono::{TimeDelta, TimeZone, Utc};
use frameshape_core::{aggregate, extract_series, normalize, MetricColumns, RateOptions};
use serde_json::json;

let result = json!([
    {"timestamp": "2024-01-01T00:00:30Z", "value": 3},
    {"timestamp": "2024-01-01T00:01:30Z", "value": 5},
]);

let frames = normalize("A", &result, "timestamp")?;
let series = extract_series(frames, &MetricColumns::default())?;

let options = RateOptions {
    from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    to: Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap(),
    interval: TimeDelta::minutes(1),
    interval_override: None,
    zero_vector: false,
    functions: vec!["count".to_string(), "sum".to_string()],
};
let frame = aggregate(&series, &options)?;

assert_eq!(frame.field_names(), vec!["timestamp", "count", "sum"]);
assert_eq!(frame.row_count(), 2);
# Ok::<(), frameshape_core::FrameError>(())
```
*/

pub mod builder;
pub mod coercion;
pub mod encode;
pub mod error;
pub mod frame;
pub mod group;
pub mod interval;
pub mod metric;
pub mod normalize;
pub mod rate;
pub mod table;

pub use encode::{encode_frame, frame_to_record_batch};
pub use error::{FieldRole, FrameError};
pub use frame::{Column, Field, Frame, FrameMeta, VisType};
pub use group::split_groups;
pub use interval::{format_interval, parse_interval, ParseIntervalError};
pub use metric::{extract_series, MetricColumns, TimeValueSeries};
pub use normalize::normalize;
pub use rate::{aggregate, RateFunction, RateOptions};

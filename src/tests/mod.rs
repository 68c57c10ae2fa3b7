use crate::config::QueryDefaults;
use crate::datasource::{DataQuery, Datasource, QueryExecutor};
use crate::error::{BoxError, DatasourceError};
use crate::query::TimeRange;
use crate::response::ResponseShapeError;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use frameshape_core::{Column, Frame, FrameError, VisType};
use mockall::*;
use serde_json::{json, Value};

mock! {
    pub Executor {}
    #[async_trait]
    impl QueryExecutor for Executor {
        async fn query(&self, surql: &str) -> Result<Value, BoxError>;
    }
}

fn at(minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, second).unwrap()
}

fn now() -> DateTime<Utc> {
    at(5, 0)
}

fn response(result: Value) -> Value {
    json!([{"status": "OK", "time": "1.5ms", "result": result}])
}

fn data_query(ref_id: &str, options: Value) -> DataQuery {
    DataQuery {
        ref_id: ref_id.to_string(),
        json: options.to_string(),
        time_range: TimeRange {
            from: at(0, 0),
            to: at(1, 0),
        },
        interval: TimeDelta::minutes(1),
    }
}

fn answering(result: Value) -> Datasource {
    let mut executor = MockExecutor::new();
    let body = response(result);
    executor.expect_query().times(1).returning(move |_| Ok(body.clone()));
    Datasource::new(Box::new(executor), QueryDefaults::default())
}

fn silent() -> Datasource {
    let mut executor = MockExecutor::new();
    executor.expect_query().times(0);
    Datasource::new(Box::new(executor), QueryDefaults::default())
}

fn samples() -> Value {
    json!([
        {"timestamp": "2024-01-01T00:00:00Z", "value": "3"},
        {"timestamp": "2024-01-01T00:01:00Z", "value": "5"},
    ])
}

fn grouped_samples() -> Value {
    json!([
        {"timestamp": "2024-01-01T00:00:10Z", "value": 1, "host": "a"},
        {"timestamp": "2024-01-01T00:00:20Z", "value": 2, "host": "b"},
        {"timestamp": "2024-01-01T00:00:30Z", "value": 3, "host": "a"},
    ])
}

fn column<'a>(frame: &'a Frame, name: &str) -> &'a Column {
    &frame.field(name).unwrap().column
}

async fn error_of(datasource: Datasource, options: Value) -> DatasourceError {
    datasource
        .query_at(&data_query("A", options), now())
        .await
        .unwrap_err()
}

#[tokio::test]
async fn test_scalar_result_in_raw_mode() {
    let datasource = answering(json!(42.0));
    let frames = datasource
        .query_at(&data_query("A", json!({"mode": "raw", "surql": "RETURN 42"})), now())
        .await
        .unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].name, "A");
    assert_eq!(column(&frames[0], "result"), &Column::Number(vec![Some(42.0)]));

    let meta = frames[0].meta.as_ref().unwrap();
    assert_eq!(meta.preferred_visualization, Some(VisType::Table));
    assert_eq!(
        meta.custom,
        Some(json!({"queryRaw": "RETURN 42", "queryRun": "RETURN 42", "status": "OK", "time": "1.5ms"}))
    );
}

#[tokio::test]
async fn test_mapping_result_splits_into_frames() {
    let datasource = answering(json!({"a": 1.0, "b": "x"}));
    let frames = datasource
        .query_at(&data_query("A", json!({"mode": "log"})), now())
        .await
        .unwrap();

    let names: Vec<_> = frames.iter().map(|frame| frame.name.as_str()).collect();
    assert_eq!(names, vec!["A:a", "A:b"]);
    assert_eq!(column(&frames[1], "result"), &Column::Text(vec!["x".to_string()]));
    assert!(frames
        .iter()
        .all(|frame| frame.meta.as_ref().unwrap().preferred_visualization == Some(VisType::Logs)));
}

#[tokio::test]
async fn test_metric_mode_keeps_time_and_value() {
    let datasource = answering(samples());
    let frames = datasource
        .query_at(&data_query("A", json!({"mode": "metric"})), now())
        .await
        .unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].field_names(), vec!["timestamp", "value"]);
    assert_eq!(column(&frames[0], "timestamp"), &Column::Time(vec![Some(at(0, 0)), Some(at(1, 0))]));
    assert_eq!(column(&frames[0], "value"), &Column::Number(vec![Some(3.0), Some(5.0)]));
    assert_eq!(
        frames[0].meta.as_ref().unwrap().preferred_visualization,
        Some(VisType::Graph)
    );
}

#[tokio::test]
async fn test_metric_rate_count_and_sum() {
    let datasource = answering(samples());
    let options = json!({"mode": "metric", "rate": true, "rateFunctions": ["sum", "count"]});
    let frames = datasource.query_at(&data_query("A", options), now()).await.unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].field_names(), vec!["timestamp", "count", "sum"]);
    assert_eq!(column(&frames[0], "count"), &Column::Count(vec![Some(1), Some(1)]));
    assert_eq!(column(&frames[0], "sum"), &Column::Number(vec![Some(3.0), Some(5.0)]));
    assert!(frames[0].meta.is_some());
}

#[tokio::test]
async fn test_group_frames_are_named_after_keys() {
    let datasource = answering(grouped_samples());
    let options = json!({"mode": "metric", "group": true, "groupBy": "host"});
    let mut frames = datasource.query_at(&data_query("A", options), now()).await.unwrap();
    frames.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<_> = frames.iter().map(|frame| frame.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(column(&frames[0], "value"), &Column::Number(vec![Some(1.0), Some(3.0)]));
    assert_eq!(column(&frames[1], "value"), &Column::Number(vec![Some(2.0)]));
    assert!(frames.iter().all(|frame| frame.meta.is_some()));
}

#[tokio::test]
async fn test_grouped_rate_with_zero_vector() {
    let datasource = answering(grouped_samples());
    let options = json!({
        "mode": "metric",
        "group": true,
        "groupBy": "host",
        "rate": true,
        "rateZero": true,
        "rateFunctions": ["count", "absence"],
    });
    let mut frames = datasource.query_at(&data_query("A", options), now()).await.unwrap();
    frames.sort_by(|a, b| a.name.cmp(&b.name));

    assert_eq!(frames.len(), 2);
    assert_eq!(column(&frames[0], "count"), &Column::Count(vec![Some(2), Some(0)]));
    assert_eq!(column(&frames[0], "absence"), &Column::Number(vec![Some(0.0), Some(1.0)]));
    assert_eq!(column(&frames[1], "count"), &Column::Count(vec![Some(1), Some(0)]));
}

#[tokio::test]
async fn test_empty_grouped_result_has_no_group_field() {
    let options = json!({"mode": "metric", "group": true, "rate": true, "rateFunctions": ["count"]});
    let error = error_of(answering(json!([])), options).await;
    assert_eq!(
        error.to_string(),
        "Metric failed: group by 'group' not found in data frame, available are: "
    );
}

#[tokio::test]
async fn test_empty_result_yields_empty_metric_frame() {
    let frames = answering(json!([]))
        .query_at(&data_query("A", json!({"mode": "metric"})), now())
        .await
        .unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].field_names(), vec!["timestamp", "value"]);
    assert_eq!(frames[0].row_count(), 0);
}

#[tokio::test]
async fn test_metric_mode_passes_text_values_through() {
    let datasource = answering(json!([
        {"timestamp": "2024-01-01T00:00:00Z", "value": 1},
        {"timestamp": "2024-01-01T00:01:00Z"},
    ]));
    let frames = datasource
        .query_at(&data_query("A", json!({"mode": "metric"})), now())
        .await
        .unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].field_names(), vec!["timestamp", "value"]);
    assert_eq!(
        column(&frames[0], "value"),
        &Column::Text(vec!["1".to_string(), String::new()])
    );
}

#[tokio::test]
async fn test_placeholders_are_substituted() {
    let mut executor = MockExecutor::new();
    executor
        .expect_query()
        .withf(|surql| {
            surql
                == "SELECT * FROM cpu WHERE time >= '2023-12-31T23:59:59.999999999Z' \
                    AND time <= '2024-01-01T00:01:00.999999999Z' AND now = '2024-01-01T00:05:00Z' \
                    GROUP BY 1m0s"
        })
        .times(1)
        .returning(|_| Ok(response(json!(1))));
    let datasource = Datasource::new(Box::new(executor), QueryDefaults::default());

    let options = json!({
        "mode": "raw",
        "surql": "SELECT * FROM cpu WHERE time >= $from AND time <= $to AND now = $now GROUP BY $interval",
    });
    let frames = datasource.query_at(&data_query("A", options), now()).await.unwrap();
    let custom = frames[0].meta.as_ref().unwrap().custom.as_ref().unwrap();
    assert!(custom["queryRaw"].as_str().unwrap().contains("$from"));
    assert!(!custom["queryRun"].as_str().unwrap().contains("$from"));
}

#[tokio::test]
async fn test_configured_defaults_apply_to_empty_columns() {
    let mut executor = MockExecutor::new();
    executor
        .expect_query()
        .returning(|_| Ok(response(json!([{"ts": "2024-01-01T00:00:00Z", "cpu": 0.5}]))));
    let defaults = QueryDefaults {
        timestamp: "ts".to_string(),
        metric_data: "cpu".to_string(),
        group_by: "group".to_string(),
    };
    let datasource = Datasource::new(Box::new(executor), defaults);

    let options = json!({"mode": "metric", "timestamp": "", "metricData": ""});
    let frames = datasource.query_at(&data_query("A", options), now()).await.unwrap();
    assert_eq!(frames[0].field_names(), vec!["ts", "cpu"]);
}

#[tokio::test]
async fn test_hidden_query_is_not_executed() {
    let frames = silent()
        .query_at(&data_query("A", json!({"hide": true, "mode": "bogus"})), now())
        .await
        .unwrap();
    assert!(frames.is_empty());
}

#[tokio::test]
async fn test_invalid_request_json() {
    let error = silent()
        .query_at(
            &DataQuery {
                json: "{not json".to_string(),
                ..data_query("A", json!({}))
            },
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(error, DatasourceError::RequestJson(_)));
    assert!(error.to_string().starts_with("Query json: "));
}

#[tokio::test]
async fn test_unsupported_mode() {
    let error = error_of(silent(), json!({"mode": "table"})).await;
    assert_eq!(error.to_string(), "Query mode: unsupported query mode 'table'");

    let error = error_of(silent(), json!({})).await;
    assert_eq!(error.to_string(), "Query mode: unsupported query mode ''");
}

#[tokio::test]
async fn test_execution_failure() {
    let mut executor = MockExecutor::new();
    executor
        .expect_query()
        .times(1)
        .returning(|_| Err("connection refused".into()));
    let datasource = Datasource::new(Box::new(executor), QueryDefaults::default());

    let error = error_of(datasource, json!({"mode": "raw"})).await;
    assert_eq!(error.to_string(), "Query failed: connection refused");
}

#[tokio::test]
async fn test_invalid_response_shape() {
    let mut executor = MockExecutor::new();
    executor.expect_query().returning(|_| Ok(json!([])));
    let datasource = Datasource::new(Box::new(executor), QueryDefaults::default());

    let error = error_of(datasource, json!({"mode": "raw"})).await;
    assert!(matches!(error, DatasourceError::ResponseShape(ResponseShapeError::Empty)));
    assert_eq!(error.to_string(), "Query failed: invalid queryResponse length");
}

#[tokio::test]
async fn test_boolean_result_is_unsupported() {
    let error = error_of(answering(json!({"ok": true})), json!({"mode": "raw"})).await;
    assert!(matches!(
        error,
        DatasourceError::Result(FrameError::UnsupportedResultType { .. })
    ));
    assert_eq!(error.to_string(), "Result failed: not supported query result type 'bool' in 'A:ok'");
}

#[tokio::test]
async fn test_metric_errors() {
    let error = error_of(answering(json!({"a": [], "b": []})), json!({"mode": "metric"})).await;
    assert!(matches!(
        error,
        DatasourceError::Metric(FrameError::MultipleFramesUnsupported { count: 2 })
    ));

    let error = error_of(
        answering(json!([{"time": "2024-01-01T00:00:00Z", "value": 1}])),
        json!({"mode": "metric"}),
    )
    .await;
    assert_eq!(
        error.to_string(),
        "Metric failed: time field 'timestamp' not found in data frame, available are: time, value"
    );

    let error = error_of(answering(samples()), json!({"mode": "metric", "group": true})).await;
    assert!(error.to_string().starts_with("Metric failed: group by 'group' not found"));
}

#[tokio::test]
async fn test_rate_errors() {
    let options = json!({"mode": "metric", "rate": true, "rateFunctions": ["count", "max"]});
    let error = error_of(answering(samples()), options).await;
    assert_eq!(error.to_string(), "Rate failed: unsupported rate function 'max'");

    let options = json!({"mode": "metric", "rate": true, "rateInterval": "often", "rateFunctions": ["count"]});
    let error = error_of(answering(samples()), options).await;
    assert!(matches!(
        error,
        DatasourceError::Rate(FrameError::InvalidRateInterval { .. })
    ));

    let text_values = json!([
        {"timestamp": "2024-01-01T00:00:00Z", "value": "high"},
        {"timestamp": "2024-01-01T00:01:00Z", "value": "low"},
    ]);
    let options = json!({"mode": "metric", "rate": true, "rateFunctions": ["sum"]});
    let error = error_of(answering(text_values), options).await;
    assert_eq!(
        error.to_string(),
        "Rate failed: data field 'value' has text cells, expected number"
    );
}

#[tokio::test]
async fn test_batch_failures_are_isolated() {
    let mut executor = MockExecutor::new();
    executor.expect_query().times(2).returning(|surql| {
        if surql.contains("broken") {
            Err("parse error".into())
        } else {
            Ok(response(json!(7)))
        }
    });
    let datasource = Datasource::new(Box::new(executor), QueryDefaults::default());

    let batch = vec![
        data_query("A", json!({"mode": "raw", "surql": "RETURN 7"})),
        data_query("B", json!({"mode": "raw", "surql": "broken"})),
        data_query("C", json!({"mode": "nope"})),
    ];
    let result = datasource.query_data(&batch).await;

    assert_eq!(result.responses.len(), 3);
    let frames = result.responses["A"].as_ref().unwrap();
    assert_eq!(column(&frames[0], "result"), &Column::Number(vec![Some(7.0)]));
    assert_eq!(
        result.responses["B"].as_ref().unwrap_err().to_string(),
        "Query failed: parse error"
    );
    assert!(matches!(result.responses["C"], Err(DatasourceError::QueryMode(_))));
}

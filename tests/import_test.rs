//! End-to-end importer tests against mock tracking and database services

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use tsbridge::config::{ImportConfig, RetryPolicy};
use tsbridge::import::MetricsImporter;
use tsbridge::Error;

fn test_config(tracking: &MockServer, db: &MockServer) -> ImportConfig {
    ImportConfig {
        tracking_endpoint: tracking.base_url(),
        db_endpoint: db.base_url(),
        project: "entity/proj".to_string(),
        name_filter: ".*".to_string(),
        timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        },
        flush_rows: 4096,
    }
}

#[tokio::test]
async fn test_import_replays_each_run_into_its_own_table() {
    let tracking = MockServer::start_async().await;
    let db = MockServer::start_async().await;

    tracking
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/runs");
            then.status(200).json_body(json!({
                "runs": [
                    {"id": "r1", "name": "run-a"},
                    {"id": "r2", "name": "run-b"},
                ],
                "next_cursor": null,
            }));
        })
        .await;
    tracking
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/runs/r1/history");
            then.status(200).json_body(json!({
                "rows": [
                    {"loss": 0.5, "tag": "v1"},
                    {"loss": 0.4, "meta": {"x": 1}},
                ],
                "next_cursor": null,
            }));
        })
        .await;
    tracking
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/runs/r2/history");
            then.status(200).json_body(json!({
                "rows": [{"acc": null}],
                "next_cursor": null,
            }));
        })
        .await;

    let insert_a = db
        .mock_async(|when, then| {
            when.method(POST)
                .path("/insert")
                .json_body_partial(r#"{"table": "run-a"}"#);
            then.status(200);
        })
        .await;
    let insert_b = db
        .mock_async(|when, then| {
            when.method(POST)
                .path("/insert")
                .json_body_partial(r#"{"table": "run-b"}"#);
            then.status(200);
        })
        .await;

    let mut importer = MetricsImporter::new(test_config(&tracking, &db)).unwrap();
    let summary = importer.import_all().await.unwrap();

    assert_eq!(summary.runs, 2);
    assert_eq!(summary.rows, 3);
    assert_eq!(insert_a.hits_async().await, 1);
    assert_eq!(insert_b.hits_async().await, 1);
}

#[tokio::test]
async fn test_empty_enumeration_logs_nothing() {
    let tracking = MockServer::start_async().await;
    let db = MockServer::start_async().await;

    tracking
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/runs");
            then.status(200)
                .json_body(json!({"runs": [], "next_cursor": null}));
        })
        .await;
    let insert = db
        .mock_async(|when, then| {
            when.method(POST).path("/insert");
            then.status(200);
        })
        .await;

    let mut importer = MetricsImporter::new(test_config(&tracking, &db)).unwrap();
    let summary = importer.import_all().await.unwrap();

    assert_eq!(summary.runs, 0);
    assert_eq!(summary.rows, 0);
    assert_eq!(insert.hits_async().await, 0);
}

#[tokio::test]
async fn test_flush_threshold_sends_during_run() {
    let tracking = MockServer::start_async().await;
    let db = MockServer::start_async().await;

    tracking
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/runs");
            then.status(200).json_body(json!({
                "runs": [{"id": "r1", "name": "run-a"}],
                "next_cursor": null,
            }));
        })
        .await;
    tracking
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/runs/r1/history");
            then.status(200).json_body(json!({
                "rows": [{"loss": 0.5}, {"loss": 0.4}, {"loss": 0.3}],
                "next_cursor": null,
            }));
        })
        .await;
    let insert = db
        .mock_async(|when, then| {
            when.method(POST).path("/insert");
            then.status(200);
        })
        .await;

    let mut config = test_config(&tracking, &db);
    config.flush_rows = 1;
    let mut importer = MetricsImporter::new(config).unwrap();
    let summary = importer.import_all().await.unwrap();

    assert_eq!(summary.rows, 3);
    // One request per row at threshold 1; the final drain finds an
    // empty buffer and sends nothing extra.
    assert_eq!(insert.hits_async().await, 3);
}

#[tokio::test]
async fn test_persistent_transient_failure_exhausts_retries() {
    let tracking = MockServer::start_async().await;
    let db = MockServer::start_async().await;

    let runs = tracking
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/runs");
            then.status(503).body("rate limited");
        })
        .await;

    let mut importer = MetricsImporter::new(test_config(&tracking, &db)).unwrap();
    let err = importer.import_all().await.unwrap_err();

    match err {
        Error::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    // Every attempt reached the service; nothing was silently skipped.
    assert_eq!(runs.hits_async().await, 3);
}

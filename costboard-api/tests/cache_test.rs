// Integration tests for caching, invalidation and health
mod common;

use common::{create_test_server, sample_provider, today};
use costboard_api::config::AppMode;
use costboard_providers::mock::MockCostProvider;
use futures_util::future::join_all;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_repeated_requests_hit_cache() {
    let provider = sample_provider();
    let server = create_test_server(provider.clone(), AppMode::Debug);

    for _ in 0..3 {
        assert_eq!(server.get("/monthly-cost.json").await.status_code(), 200);
    }
    // JSON and PNG views share one cached report.
    assert_eq!(server.get("/monthly-cost.png").await.status_code(), 200);
    assert_eq!(server.get("/monthly-totals.json").await.status_code(), 200);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_upstream_call() {
    let provider = Arc::new(MockCostProvider::sample(today()).with_delay(Duration::from_millis(100)));
    let server = create_test_server(provider.clone(), AppMode::Debug);

    let responses = join_all((0..16).map(|_| server.get("/weekly-cost.json").into_future())).await;

    assert!(responses.iter().all(|r| r.status_code() == 200));
    assert_eq!(provider.calls(), 1);

    let first = responses[0].text();
    assert!(responses.iter().all(|r| r.text() == first));
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let provider = sample_provider();
    let server = create_test_server(provider.clone(), AppMode::Debug);

    server.get("/annual-cost.json").await;
    let response = server.delete("/cache/annual").await;
    assert_eq!(response.status_code(), 204);

    server.get("/annual-cost.json").await;
    assert_eq!(provider.calls(), 2);

    // Invalidating an empty slot is still a 204.
    assert_eq!(server.delete("/cache/weekly").await.status_code(), 204);
}

#[tokio::test]
async fn test_invalidate_unknown_report_is_404() {
    let server = create_test_server(sample_provider(), AppMode::Debug);

    let response = server.delete("/cache/daily").await;
    assert_eq!(response.status_code(), 404);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "unknown_report");
}

#[tokio::test]
async fn test_health_reports_cache_stats() {
    let server = create_test_server(sample_provider(), AppMode::Production);

    server.get("/monthly-cost.json").await;
    server.get("/monthly-cost.json").await;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "mock");
    assert_eq!(body["cache"]["misses"], 1);
    assert_eq!(body["cache"]["hits"], 1);
    assert_eq!(body["cache"]["coalesced"], 0);
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let server = create_test_server(sample_provider(), AppMode::Debug);

    let doc: serde_json::Value = server.get("/api-docs/openapi.json").await.json();
    for path in ["/monthly-cost.json", "/weekly-cost.png", "/cache/{report}", "/health"] {
        assert!(doc["paths"].get(path).is_some(), "{path} missing from openapi");
    }
}

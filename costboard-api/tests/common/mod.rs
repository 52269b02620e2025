// Common test utilities and fixtures
#![allow(dead_code)]

use axum_test::TestServer;
use chrono::NaiveDate;
use costboard_api::config::AppMode;
use costboard_api::routes::create_app;
use costboard_api::{AppState, CostCache, CostReports, FixedClock};
use costboard_providers::mock::MockCostProvider;
use std::sync::Arc;
use std::time::Duration;

pub const TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Fixed "today" for every integration test.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 17).unwrap()
}

pub fn sample_provider() -> Arc<MockCostProvider> {
    Arc::new(MockCostProvider::sample(today()))
}

pub fn create_test_server(provider: Arc<MockCostProvider>, mode: AppMode) -> TestServer {
    let reports = CostReports::new(
        provider,
        CostCache::new(),
        Arc::new(FixedClock(today())),
        TTL,
        Duration::from_secs(5),
    );
    let app = create_app(AppState::new(reports, mode));
    TestServer::new(app).unwrap()
}

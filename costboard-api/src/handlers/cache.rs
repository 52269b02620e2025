use crate::app::AppState;
use crate::reports::Report;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Drop one cached report so the next request refetches it.
#[utoipa::path(
    delete,
    path = "/cache/{report}",
    tag = "Cache",
    params(
        ("report" = String, Path, description = "monthly, weekly or annual")
    ),
    responses(
        (status = 204, description = "Report invalidated"),
        (status = 404, description = "Unknown report name")
    )
)]
pub async fn invalidate_report(
    State(state): State<Arc<AppState>>,
    Path(report): Path<String>,
) -> Response {
    let Some(report) = Report::parse(&report) else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "unknown_report"}))).into_response();
    };
    state.reports.invalidate(report).await;
    StatusCode::NO_CONTENT.into_response()
}

use crate::app::AppState;
use crate::chart::render_bar_chart;
use crate::error::{ApiError, ErrorBody};
use crate::reports::Report;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use costboard_common::aggregator::totals_by_bucket;
use std::collections::BTreeMap;
use std::sync::Arc;

async fn matrix_json(state: &AppState, report: Report) -> Result<Response, ApiError> {
    let matrix = state
        .reports
        .report(&report.spec())
        .await
        .map_err(|e| ApiError::cost(e, state.mode))?;
    Ok(Json(&*matrix).into_response())
}

async fn totals_png(state: &AppState, report: Report) -> Result<Response, ApiError> {
    let matrix = state
        .reports
        .report(&report.spec())
        .await
        .map_err(|e| ApiError::cost(e, state.mode))?;
    let png = render_bar_chart(&totals_by_bucket(&matrix)).map_err(|e| {
        tracing::error!(report = %report, error = %e, "chart rendering failed");
        ApiError::chart(e, state.mode)
    })?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

#[utoipa::path(
    get,
    path = "/monthly-cost.json",
    tag = "Costs",
    responses(
        (status = 200, description = "Cost per service for each of the last six months", body = BTreeMap<String, BTreeMap<String, f64>>),
        (status = 500, description = "Cost data unavailable", body = ErrorBody)
    )
)]
pub async fn monthly_cost_json(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    matrix_json(&state, Report::Monthly).await
}

#[utoipa::path(
    get,
    path = "/monthly-cost.png",
    tag = "Costs",
    responses(
        (status = 200, description = "Bar chart of monthly totals"),
        (status = 500, description = "Cost data unavailable or chart failed", body = ErrorBody)
    )
)]
pub async fn monthly_cost_png(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    totals_png(&state, Report::Monthly).await
}

#[utoipa::path(
    get,
    path = "/monthly-totals.json",
    tag = "Costs",
    responses(
        (status = 200, description = "Total cost per month", body = BTreeMap<String, f64>),
        (status = 500, description = "Cost data unavailable", body = ErrorBody)
    )
)]
pub async fn monthly_totals_json(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, f64>>, ApiError> {
    let matrix = state
        .reports
        .monthly_cost()
        .await
        .map_err(|e| ApiError::cost(e, state.mode))?;
    Ok(Json(totals_by_bucket(&matrix)))
}

#[utoipa::path(
    get,
    path = "/weekly-cost.json",
    tag = "Costs",
    responses(
        (status = 200, description = "Daily billable cost per service for the last 28 days", body = BTreeMap<String, BTreeMap<String, f64>>),
        (status = 500, description = "Cost data unavailable", body = ErrorBody)
    )
)]
pub async fn weekly_cost_json(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    matrix_json(&state, Report::Weekly).await
}

#[utoipa::path(
    get,
    path = "/weekly-cost.png",
    tag = "Costs",
    responses(
        (status = 200, description = "Bar chart of daily totals"),
        (status = 500, description = "Cost data unavailable or chart failed", body = ErrorBody)
    )
)]
pub async fn weekly_cost_png(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    totals_png(&state, Report::Weekly).await
}

#[utoipa::path(
    get,
    path = "/annual-cost.json",
    tag = "Costs",
    responses(
        (status = 200, description = "Billable cost per service for each of the last twelve months", body = BTreeMap<String, BTreeMap<String, f64>>),
        (status = 500, description = "Cost data unavailable", body = ErrorBody)
    )
)]
pub async fn annual_cost_json(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    matrix_json(&state, Report::Annual).await
}

#[utoipa::path(
    get,
    path = "/annual-cost.png",
    tag = "Costs",
    responses(
        (status = 200, description = "Bar chart of annual totals"),
        (status = 500, description = "Cost data unavailable or chart failed", body = ErrorBody)
    )
)]
pub async fn annual_cost_png(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    totals_png(&state, Report::Annual).await
}

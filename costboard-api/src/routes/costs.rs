// Cost report routes and cache administration
use crate::app::AppState;
use crate::handlers::{cache, costs};
use axum::routing::{delete, get};
use axum::Router;
use std::sync::Arc;

pub fn create_cost_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/monthly-cost", get(costs::monthly_cost_json))
        .route("/monthly-cost.json", get(costs::monthly_cost_json))
        .route("/monthly-cost.png", get(costs::monthly_cost_png))
        .route("/monthly-totals.json", get(costs::monthly_totals_json))
        .route("/weekly-cost.json", get(costs::weekly_cost_json))
        .route("/weekly-cost.png", get(costs::weekly_cost_png))
        .route("/annual-cost.json", get(costs::annual_cost_json))
        .route("/annual-cost.png", get(costs::annual_cost_png))
        .route("/cache/{report}", delete(cache::invalidate_report))
}

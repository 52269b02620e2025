// Routes module - Centralizes all route definitions
pub mod costs;
pub mod public;

use crate::app::{create_cors, AppState};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the main application router
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(public::create_public_routes())
        .merge(costs::create_cost_routes())
}

/// Router with state, CORS and request tracing applied. Used by `main` and
/// the integration tests.
pub fn create_app(state: Arc<AppState>) -> Router {
    create_router()
        .layer(create_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Public routes: docs, landing and health
use crate::api_docs;
use crate::app::AppState;
use crate::handlers::health;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn create_public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api_docs::ApiDoc::openapi()),
        )
        .route("/", get(root))
        .route("/health", get(health::health))
}

async fn root() -> &'static str {
    "Costboard API - AWS cost reports"
}

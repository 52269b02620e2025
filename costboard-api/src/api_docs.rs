use crate::cache::CacheStats;
use crate::error::ErrorBody;
use crate::handlers::{cache, costs, health};
use crate::reports::Report;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Costs
        costs::monthly_cost_json,
        costs::monthly_cost_png,
        costs::monthly_totals_json,
        costs::weekly_cost_json,
        costs::weekly_cost_png,
        costs::annual_cost_json,
        costs::annual_cost_png,
        // Cache
        cache::invalidate_report,
        health::health
    ),
    components(
        schemas(
            ErrorBody,
            CacheStats,
            Report,
            health::HealthResponse
        )
    ),
    tags(
        (name = "costboard-api", description = "AWS cost reports"),
        (name = "Costs", description = "Cached cost matrices as JSON or PNG"),
        (name = "Cache", description = "Report cache administration"),
        (name = "Health", description = "Liveness and cache counters")
    )
)]
pub struct ApiDoc;

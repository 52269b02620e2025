use anyhow::Context;
use costboard_api::config::{ProviderManager, Settings};
use costboard_api::routes::create_app;
use costboard_api::{AppState, CostCache, CostReports, SystemClock};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env().context("Invalid configuration")?;
    let provider = ProviderManager::get_provider(&settings)
        .await
        .context("Failed to set up cost provider")?;

    tracing::info!(
        provider = provider.name(),
        region = %settings.aws_region,
        mode = ?settings.mode,
        ttl_secs = settings.cache_ttl.as_secs(),
        timeout_secs = settings.upstream_timeout.as_secs(),
        "starting costboard api"
    );

    let reports = CostReports::new(
        provider,
        CostCache::new(),
        Arc::new(SystemClock),
        settings.cache_ttl,
        settings.upstream_timeout,
    );
    let app = create_app(AppState::new(reports, settings.mode));

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    tracing::info!(addr = %settings.bind_addr, "costboard api listening");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

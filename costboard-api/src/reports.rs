//! Named cost reports on top of the cache.
//!
//! Each report is a [`ReportSpec`]: a fixed cache key plus the parameters of
//! the upstream query. [`CostReports::report`] is the only code path; the
//! per-report methods just pick a spec.

use crate::cache::{CacheStats, CachedMatrix, CostCache};
use chrono::{NaiveDate, Utc};
use costboard_common::aggregator::aggregate;
use costboard_common::query::DIMENSION_SERVICE;
use costboard_common::{CostError, CostFilter, CostQuery, DateRange, FetchKey, Granularity};
use costboard_providers::{CostProvider, ProviderError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const METRIC_BLENDED_COST: &str = "BlendedCost";

/// Source of "today". Reports compute their date ranges from it.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Report {
    Monthly,
    Weekly,
    Annual,
}

impl Report {
    pub const ALL: [Report; 3] = [Report::Monthly, Report::Weekly, Report::Annual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Report::Monthly => "monthly",
            Report::Weekly => "weekly",
            Report::Annual => "annual",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }

    pub fn spec(&self) -> ReportSpec {
        match self {
            Report::Monthly => ReportSpec {
                key: "monthly-cost",
                granularity: Granularity::Monthly,
                range: |today| DateRange::whole_months_before(today, 6),
                filter: None,
                group_by: DIMENSION_SERVICE,
                metric: METRIC_BLENDED_COST,
            },
            Report::Weekly => ReportSpec {
                key: "previous-four-weeks-data",
                granularity: Granularity::Daily,
                range: |today| DateRange::days_ending_yesterday(today, 28),
                filter: Some(CostFilter::billable_usage),
                group_by: DIMENSION_SERVICE,
                metric: METRIC_BLENDED_COST,
            },
            Report::Annual => ReportSpec {
                key: "annual-cost",
                granularity: Granularity::Monthly,
                range: |today| DateRange::whole_months_before(today, 12),
                filter: Some(CostFilter::billable_usage),
                group_by: DIMENSION_SERVICE,
                metric: METRIC_BLENDED_COST,
            },
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to fetch one report.
#[derive(Debug, Clone, Copy)]
pub struct ReportSpec {
    pub key: &'static str,
    pub granularity: Granularity,
    pub range: fn(NaiveDate) -> Option<DateRange>,
    pub filter: Option<fn() -> CostFilter>,
    pub group_by: &'static str,
    pub metric: &'static str,
}

impl ReportSpec {
    pub fn fetch_key(&self) -> FetchKey {
        FetchKey::new(self.key)
    }

    pub fn query(&self, today: NaiveDate) -> Result<CostQuery, CostError> {
        let range = (self.range)(today).ok_or_else(|| {
            CostError::Internal(format!("no date range for {} as of {today}", self.key))
        })?;
        Ok(CostQuery {
            range,
            granularity: self.granularity,
            group_by: self.group_by.to_string(),
            metric: self.metric.to_string(),
            filter: self.filter.map(|build| build()),
        })
    }
}

pub struct CostReports {
    provider: Arc<dyn CostProvider>,
    cache: Arc<CostCache>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    upstream_timeout: Duration,
}

impl CostReports {
    pub fn new(
        provider: Arc<dyn CostProvider>,
        cache: Arc<CostCache>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            clock,
            ttl,
            upstream_timeout,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn monthly_cost(&self) -> Result<CachedMatrix, CostError> {
        self.report(&Report::Monthly.spec()).await
    }

    pub async fn weekly_cost(&self) -> Result<CachedMatrix, CostError> {
        self.report(&Report::Weekly.spec()).await
    }

    pub async fn annual_cost(&self) -> Result<CachedMatrix, CostError> {
        self.report(&Report::Annual.spec()).await
    }

    /// Cached matrix for `spec`, fetching and aggregating on a miss.
    pub async fn report(&self, spec: &ReportSpec) -> Result<CachedMatrix, CostError> {
        let query = spec.query(self.clock.today())?;
        let provider = Arc::clone(&self.provider);
        let timeout = self.upstream_timeout;
        let key = spec.fetch_key();

        self.cache
            .get_or_fetch(key.clone(), self.ttl, move || {
                fetch_matrix(provider, query, timeout, key)
            })
            .await
    }

    /// Drop the cached entry for `report`. Returns whether anything was there.
    pub async fn invalidate(&self, report: Report) -> bool {
        let key = report.spec().fetch_key();
        let removed = self.cache.invalidate(&key).await;
        tracing::info!(report = %report, key = %key, removed, "report cache invalidated");
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

async fn fetch_matrix(
    provider: Arc<dyn CostProvider>,
    query: CostQuery,
    timeout: Duration,
    key: FetchKey,
) -> Result<costboard_common::CostMatrix, CostError> {
    let DateRange { start, end } = query.range;
    let started = tokio::time::Instant::now();

    let entries = match tokio::time::timeout(timeout, provider.fetch_costs(&query)).await {
        Ok(Ok(entries)) => entries,
        Ok(Err(ProviderError::Unavailable(message))) => {
            tracing::error!(key = %key, %start, %end, error = %message, "cost provider unavailable");
            return Err(CostError::UpstreamUnavailable {
                message,
                start,
                end,
            });
        }
        Ok(Err(ProviderError::Malformed(message))) => {
            tracing::error!(key = %key, %start, %end, error = %message, "cost provider returned malformed data");
            return Err(CostError::UpstreamData {
                message,
                start,
                end,
            });
        }
        Err(_) => {
            tracing::error!(key = %key, %start, %end, timeout_secs = timeout.as_secs(), "cost provider timed out");
            return Err(CostError::UpstreamUnavailable {
                message: format!("no response within {}s", timeout.as_secs()),
                start,
                end,
            });
        }
    };

    let matrix = aggregate(&entries);
    tracing::info!(
        key = %key,
        provider = provider.name(),
        entries = entries.len(),
        buckets = matrix.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "report fetched"
    );
    Ok(matrix)
}

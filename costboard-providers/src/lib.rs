use async_trait::async_trait;
use costboard_common::{CostQuery, RawCostEntry};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network, credentials, throttling: anything that kept the call from
    /// returning a response.
    #[error("{0}")]
    Unavailable(String),

    /// A response arrived but its shape is not what we expect.
    #[error("{0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Source of raw cost rows (the cost-reporting API).
///
/// Implementations must apply `query.filter` on their side so that rows it
/// rejects are never returned.
#[async_trait]
pub trait CostProvider: Send + Sync {
    /// Short provider code, e.g. "aws" or "mock".
    fn name(&self) -> &'static str;

    /// One row per (bucket, group key) for the query's range and granularity.
    async fn fetch_costs(&self, query: &CostQuery) -> Result<Vec<RawCostEntry>>;
}

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "aws")]
pub mod aws;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod aggregator;
pub mod error;
pub mod query;

pub use error::CostError;
pub use query::{CostFilter, CostQuery, DateRange, DimensionMatch, Granularity};

// --- Matrix ---

/// bucket (ISO date) -> category -> amount.
///
/// Every bucket carries the same category keys once it comes out of
/// [`aggregator::aggregate`]; absent categories are present with `0.0`.
pub type CostMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// bucket (ISO date) -> summed amount across all categories.
pub type BucketTotals = BTreeMap<String, f64>;

// --- Raw upstream rows ---

/// One cost cell as reported upstream. The amount stays a string until the
/// aggregator parses it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RawCostEntry {
    pub bucket: String,
    pub category: String,
    pub amount: String,
}

impl RawCostEntry {
    pub fn new(
        bucket: impl Into<String>,
        category: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            category: category.into(),
            amount: amount.into(),
        }
    }
}

// --- Cache keys ---

/// Identifies one cached report configuration (e.g. `monthly-cost`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FetchKey(String);

impl FetchKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FetchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FetchKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

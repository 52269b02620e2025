use chrono::NaiveDate;
use thiserror::Error;

/// Failure of a report fetch.
///
/// `Clone` because a single failed upstream call is handed to every caller
/// that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CostError {
    /// Network, auth, throttling or timeout while calling the cost API.
    #[error("cost API unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// The cost API answered with a response we cannot read.
    #[error("cost API returned malformed data: {message}")]
    UpstreamData {
        message: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CostError {
    /// Dates of the upstream call that failed, for operator debugging.
    pub fn attempted_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            CostError::UpstreamUnavailable { start, end, .. }
            | CostError::UpstreamData { start, end, .. } => Some((*start, *end)),
            CostError::Internal(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CostError::UpstreamUnavailable { .. } => "upstream_unavailable",
            CostError::UpstreamData { .. } => "upstream_data",
            CostError::Internal(_) => "internal",
        }
    }
}

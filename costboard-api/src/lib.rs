// Library entry point for the binary and the integration tests

pub mod api_docs;
pub mod app;
pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod handlers;
pub mod reports;
pub mod routes;

// Re-export commonly used types
pub use app::AppState;
pub use cache::CostCache;
pub use reports::{Clock, CostReports, FixedClock, Report, SystemClock};

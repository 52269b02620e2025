use crate::config::AppMode;
use crate::reports::CostReports;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub reports: Arc<CostReports>,
    pub mode: AppMode,
}

impl AppState {
    pub fn new(reports: CostReports, mode: AppMode) -> Arc<Self> {
        Arc::new(Self {
            reports: Arc::new(reports),
            mode,
        })
    }
}

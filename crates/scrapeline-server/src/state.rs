use std::sync::Arc;

use scrapeline_core::Metrics;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    /// Counters written by the scraping loop and read by `/metrics`.
    pub metrics: Arc<Metrics>,
}

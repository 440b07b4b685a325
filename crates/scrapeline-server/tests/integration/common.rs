use std::sync::Arc;

use axum::Router;

use scrapeline_core::Metrics;
use scrapeline_server::routes;
use scrapeline_server::state::AppState;

pub struct TestApp {
    pub router: Router,
    pub metrics: Arc<Metrics>,
}

/// Build the router over a fresh metrics registry.
pub fn setup_test_app() -> TestApp {
    let metrics = Arc::new(Metrics::new());
    let state = Arc::new(AppState {
        metrics: metrics.clone(),
    });

    TestApp {
        router: routes::router(state),
        metrics,
    }
}

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;

use scrapeline_core::ExpositionFormat;

use crate::state::AppState;

/// Build the router serving the liveness check and metrics.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Liveness check: always 200, whatever the scraping loop is doing.
async fn health() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    let format = ExpositionFormat::negotiate(accept);

    (
        [(header::CONTENT_TYPE, format.content_type())],
        state.metrics.render(format),
    )
}

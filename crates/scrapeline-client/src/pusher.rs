use std::time::Duration;

use scrapeline_core::error::AppError;
use scrapeline_core::models::Item;
use scrapeline_core::traits::ItemPusher;

use crate::http::{DEFAULT_HTTP_TIMEOUT, build_client, ensure_success, map_request_error};

/// POSTs each item as a JSON body.
///
/// Every push opens its own client and drops it before returning, so no
/// connection outlives a single delivery.
#[derive(Debug, Clone)]
pub struct HttpPusher {
    timeout: Duration,
}

impl Default for HttpPusher {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

impl HttpPusher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ItemPusher for HttpPusher {
    async fn push(&self, url: &str, item: &Item) -> Result<(), AppError> {
        let client = build_client(self.timeout)?;
        let response = client
            .post(url)
            .json(item)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout))?;
        ensure_success(response, url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;

    use super::*;
    use crate::http::test_server::serve;

    #[tokio::test]
    async fn posts_item_as_json() {
        let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route(
                "/",
                post(
                    |State(received): State<Arc<Mutex<Vec<serde_json::Value>>>>,
                     axum::Json(body): axum::Json<serde_json::Value>| async move {
                        received.lock().unwrap().push(body);
                        StatusCode::OK
                    },
                ),
            )
            .with_state(received.clone());
        let base = serve(router).await;

        let item = Item::new(serde_json::json!({"title": "hello", "url": "https://x"}));
        HttpPusher::default()
            .push(&format!("{base}/"), &item)
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], *item.as_value());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route("/", post(|| async { StatusCode::BAD_GATEWAY }));
        let base = serve(router).await;

        let err = HttpPusher::default()
            .push(&format!("{base}/"), &Item::new(serde_json::json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::HttpError(ref msg) if msg.contains("502")));
    }

    #[tokio::test]
    async fn unreachable_target_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpPusher::new(Duration::from_secs(2))
            .push(&format!("http://{addr}/"), &Item::new(serde_json::json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NetworkError(_) | AppError::Timeout(_)));
    }
}

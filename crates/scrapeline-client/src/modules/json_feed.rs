use std::collections::VecDeque;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use scrapeline_core::error::AppError;
use scrapeline_core::models::{Item, Parameters};
use scrapeline_core::traits::{ItemStream, ScraperModule};
use serde_json::Value;

use crate::http::{DEFAULT_HTTP_TIMEOUT, build_client, ensure_success, map_request_error};

pub const MODULE_NAME: &str = "json_feed";

/// Reference module: yields every element of a remote JSON array.
///
/// Parameters:
/// - `feed_url` (required): URL of the feed; `{keyword}` is replaced by the
///   URL-encoded `keyword` parameter.
///
/// The feed is either a JSON array or an object with an `items` array. It is
/// fetched once per `query`, when the stream is first polled.
///
/// Since the fetch runs inside the first pull, the loop's item timeout bounds
/// it too. A feed slower than that is reported as a timeout interruption, not
/// as an HTTP error.
#[derive(Clone)]
pub struct JsonFeedModule {
    client: Client,
    timeout: Duration,
}

impl JsonFeedModule {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout)?,
            timeout,
        })
    }
}

impl ScraperModule for JsonFeedModule {
    fn query(&self, parameters: &Parameters) -> Result<ItemStream, AppError> {
        let url = feed_url(parameters)?;
        tracing::info!(%url, "Querying JSON feed");

        let state = FeedState::Pending {
            client: self.client.clone(),
            url,
            timeout: self.timeout,
        };
        Ok(futures::stream::unfold(state, next_item).boxed())
    }
}

enum FeedState {
    Pending {
        client: Client,
        url: String,
        timeout: Duration,
    },
    Draining(VecDeque<Value>),
    Done,
}

async fn next_item(state: FeedState) -> Option<(Result<Item, AppError>, FeedState)> {
    let mut queue = match state {
        FeedState::Done => return None,
        FeedState::Draining(queue) => queue,
        FeedState::Pending {
            client,
            url,
            timeout,
        } => match fetch_feed(&client, &url, timeout).await {
            Ok(items) => VecDeque::from(items),
            Err(e) => return Some((Err(e), FeedState::Done)),
        },
    };

    let value = queue.pop_front()?;
    Some((Ok(Item::new(value)), FeedState::Draining(queue)))
}

async fn fetch_feed(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<Value>, AppError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| map_request_error(e, timeout))?;
    let body = ensure_success(response, url)?
        .text()
        .await
        .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;

    match serde_json::from_str(&body)? {
        Value::Array(items) => Ok(items),
        Value::Object(mut document) => match document.remove("items") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(AppError::StreamError(
                "Feed document has no 'items' array".into(),
            )),
        },
        _ => Err(AppError::StreamError(
            "Feed must be a JSON array or an object with 'items'".into(),
        )),
    }
}

fn feed_url(parameters: &Parameters) -> Result<String, AppError> {
    let template = parameters
        .get("feed_url")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::QueryError("json_feed requires a 'feed_url' parameter".into())
        })?;
    let keyword = parameters
        .get("keyword")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let encoded: String = url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
    Ok(template.replace("{keyword}", &encoded))
}

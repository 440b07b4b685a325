use std::time::Duration;

use reqwest::Client;
use scrapeline_core::AppError;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("scrapeline/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest client with the shared User-Agent and a request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::HttpError(e.to_string()))
}

/// Classify a failed request the same way everywhere.
pub(crate) fn map_request_error(e: reqwest::Error, timeout: Duration) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout.as_secs())
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}

/// Turn a non-2xx response into an error.
pub(crate) fn ensure_success(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::HttpError(format!(
            "HTTP {} for {}",
            status.as_u16(),
            url
        )));
    }
    Ok(response)
}

use std::time::Duration;

use reqwest::Client;
use scrapeline_core::error::AppError;
use scrapeline_core::models::ScraperConfiguration;
use scrapeline_core::traits::{ConfigurationSource, StaticConfiguration};

use crate::http::{DEFAULT_HTTP_TIMEOUT, build_client, ensure_success, map_request_error};

/// Fetches the scraper configuration document over HTTP on every call.
///
/// Not cached: every generator (re)creation sees the current document.
#[derive(Clone)]
pub struct HttpConfigurationSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpConfigurationSource {
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        Self::with_timeout(url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
            timeout,
        })
    }
}

impl ConfigurationSource for HttpConfigurationSource {
    async fn get_scrapers_configuration(&self) -> Result<ScraperConfiguration, AppError> {
        tracing::debug!(url = %self.url, "Fetching scrapers configuration");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout))?;

        let body = ensure_success(response, &self.url)?
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;

        Ok(serde_json::from_str(&body)?)
    }
}

/// Either a fixed configuration or one fetched over HTTP.
#[derive(Clone)]
pub enum ConfigurationProvider {
    Static(StaticConfiguration),
    Http(HttpConfigurationSource),
}

impl ConfigurationProvider {
    /// HTTP when a URL is given, an empty static configuration otherwise.
    pub fn from_url(url: Option<&str>, timeout: Duration) -> Result<Self, AppError> {
        match url {
            Some(url) => Ok(Self::Http(HttpConfigurationSource::with_timeout(url, timeout)?)),
            None => Ok(Self::Static(StaticConfiguration::default())),
        }
    }
}

impl ConfigurationSource for ConfigurationProvider {
    async fn get_scrapers_configuration(&self) -> Result<ScraperConfiguration, AppError> {
        match self {
            Self::Static(source) => source.get_scrapers_configuration().await,
            Self::Http(source) => source.get_scrapers_configuration().await,
        }
    }
}

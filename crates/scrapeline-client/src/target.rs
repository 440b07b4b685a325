use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use scrapeline_core::error::AppError;
use scrapeline_core::traits::TargetResolver;
use url::Url;

use crate::http::{DEFAULT_HTTP_TIMEOUT, build_client, ensure_success, map_request_error};

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Read an address from the environment, `None` when unset or blank.
fn lookup_address(lookup: &EnvLookup, key: &str) -> Option<String> {
    lookup(key)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Turn `host:port` or a full URL into an absolute http(s) URL.
pub(crate) fn normalize_target(raw: &str) -> Result<String, AppError> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| AppError::ConfigError(format!("Invalid target address '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        scheme => Err(AppError::ConfigError(format!(
            "Target scheme '{scheme}' is not allowed (only http/https)"
        ))),
    }
}

/// Resolves the target directly from the environment variable named by the
/// address key. The variable is read on every call.
#[derive(Clone)]
pub struct EnvTargetResolver {
    lookup: EnvLookup,
}

impl Default for EnvTargetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvTargetResolver {
    pub fn new() -> Self {
        Self::with_lookup(process_env)
    }

    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }
}

impl TargetResolver for EnvTargetResolver {
    async fn resolve(&self, service: &str, address_key: &str) -> Result<Option<String>, AppError> {
        let Some(address) = lookup_address(&self.lookup, address_key) else {
            tracing::debug!(%service, %address_key, "Target address not set");
            return Ok(None);
        };
        normalize_target(&address).map(Some)
    }
}

/// Resolves the target through a discovery endpoint.
///
/// The address key names the discovery base URL; `GET {base}/{service}`
/// must answer with a JSON array of target addresses. Successive calls rotate
/// through the returned addresses.
#[derive(Clone)]
pub struct DiscoveryTargetResolver {
    client: Client,
    lookup: EnvLookup,
    timeout: Duration,
    cursor: Arc<AtomicUsize>,
}

impl DiscoveryTargetResolver {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout)?,
            lookup: Arc::new(process_env),
            timeout,
            cursor: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn with_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.lookup = Arc::new(lookup);
        self
    }
}

impl TargetResolver for DiscoveryTargetResolver {
    async fn resolve(&self, service: &str, address_key: &str) -> Result<Option<String>, AppError> {
        let Some(address) = lookup_address(&self.lookup, address_key) else {
            tracing::debug!(%service, %address_key, "Discovery address not set");
            return Ok(None);
        };
        let base = normalize_target(&address)?;
        let url = format!("{}/{}", base.trim_end_matches('/'), service);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let targets: Vec<String> = ensure_success(response, &url)?
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Invalid discovery response: {e}")))?;
        let targets: Vec<&str> = targets
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();

        if targets.is_empty() {
            return Ok(None);
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % targets.len();
        normalize_target(targets[index]).map(Some)
    }
}

/// Direct or discovery-based target resolution, chosen at startup.
#[derive(Clone)]
pub enum TargetProvider {
    Direct(EnvTargetResolver),
    Discovery(DiscoveryTargetResolver),
}

impl TargetProvider {
    pub fn new(discovery: bool, timeout: Duration) -> Result<Self, AppError> {
        if discovery {
            Ok(Self::Discovery(DiscoveryTargetResolver::with_timeout(timeout)?))
        } else {
            Ok(Self::Direct(EnvTargetResolver::new()))
        }
    }
}

impl TargetResolver for TargetProvider {
    async fn resolve(&self, service: &str, address_key: &str) -> Result<Option<String>, AppError> {
        match self {
            Self::Direct(resolver) => resolver.resolve(service, address_key).await,
            Self::Discovery(resolver) => resolver.resolve(service, address_key).await,
        }
    }
}

use std::time::Duration;

use clap::Parser;

use scrapeline_core::LoopConfig;
use scrapeline_core::dispatch::{DEFAULT_TARGET_ADDRESS_KEY, DEFAULT_TARGET_SERVICE};
use scrapeline_core::error::AppError;
use scrapeline_core::parameters::DEFAULT_MODULE_REF_PREFIX;

/// Startup configuration. Every flag falls back to an environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "scrapeline", version, about = "Scraper module harness")]
pub struct Args {
    /// Registry name of the scraper module to run
    #[arg(long, env = "scraper_module", required_unless_present = "modules")]
    pub module: Option<String>,

    /// Worker pool mode: `name=count` pairs, comma separated
    #[arg(long, env = "SCRAPER_MODULES", conflicts_with = "module")]
    pub modules: Option<String>,

    /// Port for the health and metrics server
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Seconds to sleep after every loop iteration
    #[arg(long, env = "SLEEP_BETWEEN_ITEMS", default_value_t = 1)]
    pub sleep_between_items: u64,

    /// Seconds to wait for a single item before dropping the stream
    #[arg(long, env = "ITEM_TIMEOUT", default_value_t = 20)]
    pub item_timeout: u64,

    /// Emit JSON log lines with span-close events
    #[arg(long, env = "TRACE", default_value_t = false)]
    pub trace: bool,

    /// Service name used to resolve the push target
    #[arg(long, env = "TARGET_SERVICE", default_value = DEFAULT_TARGET_SERVICE)]
    pub target_service: String,

    /// Environment variable holding the push target address
    #[arg(long, env = "TARGET_ADDRESS_KEY", default_value = DEFAULT_TARGET_ADDRESS_KEY)]
    pub target_address_key: String,

    /// Treat the target address as a discovery endpoint
    #[arg(long, env = "TARGET_DISCOVERY", default_value_t = false)]
    pub target_discovery: bool,

    /// URL of the scrapers configuration document
    #[arg(long, env = "SCRAPERS_CONFIGURATION_URL")]
    pub configuration_url: Option<String>,

    /// Prefix joined with the module name to look up module-specific parameters
    #[arg(long, env = "MODULE_REF_PREFIX", default_value = DEFAULT_MODULE_REF_PREFIX)]
    pub module_ref_prefix: String,

    /// Timeout in seconds for outgoing HTTP calls
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout: u64,
}

/// Which loops the process runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Single(String),
    Pool(Vec<(String, usize)>),
}

impl Args {
    pub fn run_mode(&self) -> Result<RunMode, AppError> {
        match (&self.modules, &self.module) {
            (Some(modules), _) => parse_concurrency(modules).map(RunMode::Pool),
            (None, Some(module)) => Ok(RunMode::Single(module.clone())),
            (None, None) => Err(AppError::ConfigError(
                "Either a module or a module pool must be configured".into(),
            )),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    /// Loop settings derived from the arguments, validated.
    pub fn loop_config(&self) -> Result<LoopConfig, AppError> {
        if self.http_timeout == 0 {
            return Err(AppError::ConfigError(
                "HTTP timeout must be at least 1 second".into(),
            ));
        }
        let config = LoopConfig {
            sleep_between_items: Duration::from_secs(self.sleep_between_items),
            item_timeout: Duration::from_secs(self.item_timeout),
            target_service: self.target_service.clone(),
            target_address_key: self.target_address_key.clone(),
            module_ref_prefix: self.module_ref_prefix.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parse `rss=2,bluesky=1` into per-module worker counts.
pub fn parse_concurrency(raw: &str) -> Result<Vec<(String, usize)>, AppError> {
    let mut concurrency: Vec<(String, usize)> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, count) = entry.split_once('=').ok_or_else(|| {
            AppError::ConfigError(format!("Expected 'module=count', got '{entry}'"))
        })?;
        let name = name.trim();
        let count: usize = count.trim().parse().map_err(|_| {
            AppError::ConfigError(format!("Invalid worker count for '{name}': '{count}'"))
        })?;
        if name.is_empty() {
            return Err(AppError::ConfigError(format!("Missing module name in '{entry}'")));
        }
        if concurrency.iter().any(|(existing, _)| existing == name) {
            return Err(AppError::ConfigError(format!("Module '{name}' is listed twice")));
        }
        concurrency.push((name.to_string(), count));
    }
    if concurrency.is_empty() {
        return Err(AppError::ConfigError("Module pool is empty".into()));
    }
    Ok(concurrency)
}

//! Scraper modules compiled into the binary.

pub mod json_feed;

use std::sync::Arc;
use std::time::Duration;

use scrapeline_core::error::AppError;
use scrapeline_core::registry::ModuleRegistry;

pub use json_feed::JsonFeedModule;

/// Registry holding every built-in module under its configuration name.
pub fn builtin_registry(http_timeout: Duration) -> Result<ModuleRegistry, AppError> {
    let mut registry = ModuleRegistry::new();
    registry.register(
        json_feed::MODULE_NAME,
        Arc::new(JsonFeedModule::with_timeout(http_timeout)?),
    );
    Ok(registry)
}

use std::time::Duration;

use crate::dispatch::{DEFAULT_TARGET_ADDRESS_KEY, DEFAULT_TARGET_SERVICE};
use crate::error::AppError;
use crate::generator::DEFAULT_ITEM_TIMEOUT;
use crate::parameters::DEFAULT_MODULE_REF_PREFIX;

/// Configuration of the scraping loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Pause after every iteration, whether or not an item was obtained.
    pub sleep_between_items: Duration,
    /// Maximum wait for a single item before the stream is dropped.
    pub item_timeout: Duration,
    /// Service name passed to the target resolver.
    pub target_service: String,
    /// Environment key holding the target address.
    pub target_address_key: String,
    /// Prefix of the canonical module reference.
    pub module_ref_prefix: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            sleep_between_items: Duration::from_secs(1),
            item_timeout: DEFAULT_ITEM_TIMEOUT,
            target_service: DEFAULT_TARGET_SERVICE.to_string(),
            target_address_key: DEFAULT_TARGET_ADDRESS_KEY.to_string(),
            module_ref_prefix: DEFAULT_MODULE_REF_PREFIX.to_string(),
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.item_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "Item timeout must be at least 1 second".into(),
            ));
        }
        if self.target_service.is_empty() || self.target_address_key.is_empty() {
            return Err(AppError::ConfigError(
                "Target service and address key must not be empty".into(),
            ));
        }
        Ok(())
    }
}

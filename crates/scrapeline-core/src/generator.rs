//! Lifecycle of a module's item stream.
//!
//! The stream is created lazily, pulled one item at a time under a timeout,
//! and dropped on any interruption (timeout, exhaustion, error). The next
//! `ensure_active` call rebuilds it from freshly resolved parameters instead
//! of resuming the old one.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::error::AppError;
use crate::metrics::{InterruptReason, Metrics};
use crate::models::Item;
use crate::parameters::ParameterResolver;
use crate::traits::{ConfigurationSource, ItemStream, KeywordSelector, ScraperModule};

pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(20);

/// Outcome of pulling one item from the active stream.
#[derive(Debug)]
pub enum NextItem {
    Item(Item),
    Timeout,
    Exhausted,
    Failed(AppError),
}

impl NextItem {
    pub fn interrupt_reason(&self) -> Option<InterruptReason> {
        match self {
            NextItem::Item(_) => None,
            NextItem::Timeout => Some(InterruptReason::Timeout),
            NextItem::Exhausted => Some(InterruptReason::Exhausted),
            NextItem::Failed(_) => Some(InterruptReason::Error),
        }
    }
}

pub struct ItemGenerator<C, K>
where
    C: ConfigurationSource,
    K: KeywordSelector,
{
    module: Arc<dyn ScraperModule>,
    module_name: String,
    parameters: ParameterResolver<C, K>,
    metrics: Arc<Metrics>,
    timeout: Duration,
    handle: Option<ItemStream>,
}

impl<C, K> ItemGenerator<C, K>
where
    C: ConfigurationSource,
    K: KeywordSelector,
{
    pub fn new(
        module: Arc<dyn ScraperModule>,
        module_name: impl Into<String>,
        parameters: ParameterResolver<C, K>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            module,
            module_name: module_name.into(),
            parameters,
            metrics,
            timeout: DEFAULT_ITEM_TIMEOUT,
            handle: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Create the stream if there is none. Returns `true` if a new one was made.
    ///
    /// Any failure here is a [`AppError::GeneratorCreation`]; callers treat it
    /// as fatal.
    #[tracing::instrument(name = "get_generator", skip(self), fields(module = %self.module_name))]
    pub async fn ensure_active(&mut self) -> Result<bool, AppError> {
        if self.handle.is_some() {
            return Ok(false);
        }

        let parameters = self
            .parameters
            .resolve(&self.module_name)
            .await
            .map_err(|e| AppError::generator_creation(&self.module_name, e))?;
        tracing::info!(?parameters, "Parameters are ready");

        let stream = self
            .module
            .query(&parameters)
            .map_err(|e| AppError::generator_creation(&self.module_name, e))?;

        self.handle = Some(stream);
        self.metrics.set_generator_active(&self.module_name, true);
        Ok(true)
    }

    /// Pull the next item, bounded by the configured timeout.
    #[tracing::instrument(name = "wait", skip(self), fields(module = %self.module_name))]
    pub async fn next(&mut self) -> NextItem {
        let Some(stream) = self.handle.as_mut() else {
            return NextItem::Exhausted;
        };

        let pulled = tokio::time::timeout(self.timeout, stream.next()).await;
        let outcome = match pulled {
            Err(_) => {
                tracing::info!(timeout_secs = self.timeout.as_secs(), "Iteration timed out");
                NextItem::Timeout
            }
            Ok(None) => {
                tracing::info!("Stopped iteration");
                NextItem::Exhausted
            }
            Ok(Some(Err(e))) => {
                tracing::error!(error = %e, "An error occurred while iterating");
                NextItem::Failed(e)
            }
            Ok(Some(Ok(item))) => return NextItem::Item(item),
        };

        if let Some(reason) = outcome.interrupt_reason() {
            self.drop_handle(reason);
        }
        outcome
    }

    fn drop_handle(&mut self, reason: InterruptReason) {
        self.handle = None;
        self.metrics.set_generator_active(&self.module_name, false);
        self.metrics.inc_interruption(&self.module_name, reason);
    }
}

use std::sync::Arc;

use crate::metrics::Metrics;
use crate::models::Item;
use crate::traits::{ItemPusher, TargetResolver};

pub const DEFAULT_TARGET_SERVICE: &str = "upipe";
pub const DEFAULT_TARGET_ADDRESS_KEY: &str = "UPIPE_ADDR";

/// What happened to a dispatched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered { target: String },
    DeliveryFailed { target: String, error: String },
    NoTarget,
}

/// Resolves a target, pushes the item, and counts it.
///
/// Fire-and-forget: nothing is retried and no failure propagates. The push
/// counter measures items obtained from the module, so it is incremented on
/// every path, delivered or not.
#[derive(Clone)]
pub struct DispatchPipeline<T, P>
where
    T: TargetResolver,
    P: ItemPusher,
{
    resolver: T,
    pusher: P,
    metrics: Arc<Metrics>,
    service: String,
    address_key: String,
}

impl<T, P> DispatchPipeline<T, P>
where
    T: TargetResolver,
    P: ItemPusher,
{
    pub fn new(resolver: T, pusher: P, metrics: Arc<Metrics>) -> Self {
        Self {
            resolver,
            pusher,
            metrics,
            service: DEFAULT_TARGET_SERVICE.to_string(),
            address_key: DEFAULT_TARGET_ADDRESS_KEY.to_string(),
        }
    }

    pub fn with_target(
        mut self,
        service: impl Into<String>,
        address_key: impl Into<String>,
    ) -> Self {
        self.service = service.into();
        self.address_key = address_key.into();
        self
    }

    pub async fn dispatch(&self, item: &Item, module_name: &str) -> DispatchOutcome {
        let outcome = match self.resolve_target().await {
            Some(target) => {
                tracing::info!(%target, "Pushing item");
                match self.push_item(&target, item).await {
                    Ok(()) => DispatchOutcome::Delivered { target },
                    Err(error) => DispatchOutcome::DeliveryFailed { target, error },
                }
            }
            None => {
                tracing::info!(
                    service = %self.service,
                    address_key = %self.address_key,
                    "Found no valid target to push to, skipping item"
                );
                tracing::debug!(item = %item.as_value(), "Skipped item");
                DispatchOutcome::NoTarget
            }
        };

        self.metrics.inc_push(module_name);
        outcome
    }

    async fn resolve_target(&self) -> Option<String> {
        match self.resolver.resolve(&self.service, &self.address_key).await {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(service = %self.service, error = %e, "Target resolution failed");
                None
            }
        }
    }

    #[tracing::instrument(name = "push_item", skip(self, item))]
    async fn push_item(&self, target: &str, item: &Item) -> Result<(), String> {
        self.pusher.push(target, item).await.map_err(|e| {
            tracing::error!(error = %e, "An error occurred while pushing an item");
            e.to_string()
        })
    }
}

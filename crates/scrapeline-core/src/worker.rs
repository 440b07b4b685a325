use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::LoopConfig;
use crate::dispatch::{DispatchOutcome, DispatchPipeline};
use crate::error::AppError;
use crate::generator::{ItemGenerator, NextItem};
use crate::metrics::{InterruptReason, Metrics};
use crate::parameters::ParameterResolver;
use crate::traits::{
    ConfigurationSource, ItemPusher, KeywordSelector, ScraperModule, TargetResolver,
};

/// Events emitted by the worker for monitoring/logging.
#[derive(Debug, Clone)]
pub enum WorkerEvent<'a> {
    Started {
        module: &'a str,
        run_id: Uuid,
    },
    Iteration,
    GeneratorCreated {
        module: &'a str,
    },
    ItemObtained {
        module: &'a str,
    },
    EmptyItem {
        module: &'a str,
    },
    StreamInterrupted {
        module: &'a str,
        reason: InterruptReason,
    },
    ItemDispatched {
        module: &'a str,
        outcome: &'a DispatchOutcome,
    },
    Aborted {
        module: &'a str,
        error: &'a AppError,
    },
    Stopped {
        module: &'a str,
        items_dispatched: u64,
    },
}

/// Trait for receiving worker events (decoupled logging).
pub trait WorkerReporter: Send + Sync {
    fn report(&self, event: WorkerEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWorkerReporter;

impl WorkerReporter for TracingWorkerReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        match event {
            WorkerEvent::Started { module, run_id } => {
                tracing::info!(%module, %run_id, "Scraping worker started");
            }
            WorkerEvent::Iteration => {
                tracing::debug!("Scraping loop");
            }
            WorkerEvent::GeneratorCreated { module } => {
                tracing::info!(%module, "Generator created");
            }
            WorkerEvent::ItemObtained { module } => {
                tracing::debug!(%module, "Item obtained");
            }
            WorkerEvent::EmptyItem { module } => {
                tracing::debug!(%module, "Module yielded an empty item, skipping");
            }
            WorkerEvent::StreamInterrupted { module, reason } => {
                tracing::info!(%module, %reason, "Generator dropped, will recreate");
            }
            WorkerEvent::ItemDispatched { module, outcome } => match outcome {
                DispatchOutcome::Delivered { target } => {
                    tracing::info!(%module, %target, "Item delivered");
                }
                DispatchOutcome::DeliveryFailed { target, error } => {
                    tracing::warn!(%module, %target, %error, "Item dropped after failed delivery");
                }
                DispatchOutcome::NoTarget => {
                    tracing::info!(%module, "Item dropped, no target");
                }
            },
            WorkerEvent::Aborted { module, error } => {
                tracing::error!(
                    %module,
                    %error,
                    "A critical error occurred while instantiating a scraping module"
                );
            }
            WorkerEvent::Stopped {
                module,
                items_dispatched,
            } => {
                tracing::info!(%module, %items_dispatched, "Scraping worker stopped");
            }
        }
    }
}

/// Drives one module: pull an item, dispatch it, sleep, repeat.
pub struct ScrapeWorker<C, K, T, P>
where
    C: ConfigurationSource,
    K: KeywordSelector,
    T: TargetResolver,
    P: ItemPusher,
{
    generator: ItemGenerator<C, K>,
    dispatch: DispatchPipeline<T, P>,
    config: LoopConfig,
}

impl<C, K, T, P> ScrapeWorker<C, K, T, P>
where
    C: ConfigurationSource,
    K: KeywordSelector,
    T: TargetResolver,
    P: ItemPusher,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        module: Arc<dyn ScraperModule>,
        module_name: impl Into<String>,
        configuration: C,
        keywords: K,
        resolver: T,
        pusher: P,
        metrics: Arc<Metrics>,
        config: LoopConfig,
    ) -> Self {
        let parameters = ParameterResolver::new(configuration, keywords)
            .with_module_ref_prefix(config.module_ref_prefix.clone());
        let generator = ItemGenerator::new(module, module_name, parameters, metrics.clone())
            .with_timeout(config.item_timeout);
        let dispatch = DispatchPipeline::new(resolver, pusher, metrics)
            .with_target(config.target_service.clone(), config.target_address_key.clone());

        Self {
            generator,
            dispatch,
            config,
        }
    }

    /// Run the scraping loop until cancellation.
    ///
    /// Cancellation is observed at the top of each iteration and during the
    /// inter-item sleep; an item wait or dispatch in progress always finishes.
    /// Returns an error only when the generator cannot be created.
    pub async fn run<WR: WorkerReporter>(
        &mut self,
        cancel_token: CancellationToken,
        reporter: &WR,
    ) -> Result<(), AppError> {
        let module = self.generator.module_name().to_string();
        reporter.report(WorkerEvent::Started {
            module: &module,
            run_id: Uuid::new_v4(),
        });

        let mut items_dispatched = 0u64;

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            reporter.report(WorkerEvent::Iteration);

            match self.generator.ensure_active().await {
                Ok(true) => reporter.report(WorkerEvent::GeneratorCreated { module: &module }),
                Ok(false) => {}
                Err(e) => {
                    reporter.report(WorkerEvent::Aborted {
                        module: &module,
                        error: &e,
                    });
                    return Err(e);
                }
            }

            match self.generator.next().await {
                NextItem::Item(item) if item.is_empty() => {
                    reporter.report(WorkerEvent::EmptyItem { module: &module });
                }
                NextItem::Item(item) => {
                    reporter.report(WorkerEvent::ItemObtained { module: &module });
                    let outcome = self.dispatch.dispatch(&item, &module).await;
                    items_dispatched += 1;
                    reporter.report(WorkerEvent::ItemDispatched {
                        module: &module,
                        outcome: &outcome,
                    });
                }
                interrupted => {
                    if let Some(reason) = interrupted.interrupt_reason() {
                        reporter.report(WorkerEvent::StreamInterrupted {
                            module: &module,
                            reason,
                        });
                    }
                }
            }

            tokio::select! {
                () = tokio::time::sleep(self.config.sleep_between_items) => {}
                () = cancel_token.cancelled() => {}
            }
        }

        reporter.report(WorkerEvent::Stopped {
            module: &module,
            items_dispatched,
        });

        Ok(())
    }
}

//! Several concurrent scraping loops per module, kept at a fixed count.
//!
//! Every worker shares the pool's cancellation token and collaborators. A
//! worker that returns, with or without an error, is replaced after
//! `respawn_delay` until the token is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::LoopConfig;
use crate::error::AppError;
use crate::metrics::Metrics;
use crate::registry::ModuleRegistry;
use crate::traits::{ConfigurationSource, ItemPusher, KeywordSelector, TargetResolver};
use crate::worker::{ScrapeWorker, WorkerReporter};

pub const DEFAULT_RESPAWN_DELAY: Duration = Duration::from_secs(1);

type WorkerExit = (String, Result<(), AppError>);

pub struct WorkerPool<C, K, T, P> {
    registry: ModuleRegistry,
    concurrency: Vec<(String, usize)>,
    configuration: C,
    keywords: K,
    resolver: T,
    pusher: P,
    metrics: Arc<Metrics>,
    config: LoopConfig,
    respawn_delay: Duration,
}

impl<C, K, T, P> WorkerPool<C, K, T, P>
where
    C: ConfigurationSource + 'static,
    K: KeywordSelector + 'static,
    T: TargetResolver + 'static,
    P: ItemPusher + 'static,
{
    /// Fails with [`AppError::ModuleNotFound`] if any listed module is unknown.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: ModuleRegistry,
        concurrency: Vec<(String, usize)>,
        configuration: C,
        keywords: K,
        resolver: T,
        pusher: P,
        metrics: Arc<Metrics>,
        config: LoopConfig,
    ) -> Result<Self, AppError> {
        for (module, _) in &concurrency {
            registry.resolve(module)?;
        }
        Ok(Self {
            registry,
            concurrency,
            configuration,
            keywords,
            resolver,
            pusher,
            metrics,
            config,
            respawn_delay: DEFAULT_RESPAWN_DELAY,
        })
    }

    pub fn with_respawn_delay(mut self, delay: Duration) -> Self {
        self.respawn_delay = delay;
        self
    }

    /// Total number of workers the pool keeps alive.
    pub fn size(&self) -> usize {
        self.concurrency.iter().map(|(_, count)| count).sum()
    }

    /// Run every worker until `cancel_token` fires, replacing those that stop.
    pub async fn run<WR: WorkerReporter + 'static>(
        &self,
        cancel_token: CancellationToken,
        reporter: Arc<WR>,
    ) -> Result<(), AppError> {
        let mut tasks: JoinSet<WorkerExit> = JoinSet::new();
        for (module, count) in &self.concurrency {
            tracing::info!(%module, workers = count, "Starting module workers");
            for _ in 0..*count {
                self.spawn_worker(&mut tasks, module, &cancel_token, &reporter)?;
            }
        }

        loop {
            let joined = tokio::select! {
                () = cancel_token.cancelled() => break,
                joined = tasks.join_next() => joined,
            };

            let module = match joined {
                None => break,
                Some(Ok((module, Ok(())))) => {
                    tracing::info!(%module, "Worker finished");
                    module
                }
                Some(Ok((module, Err(e)))) => {
                    tracing::error!(%module, error = %e, "Worker failed");
                    module
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Worker task panicked, not respawning");
                    continue;
                }
            };

            tokio::select! {
                () = tokio::time::sleep(self.respawn_delay) => {}
                () = cancel_token.cancelled() => break,
            }
            tracing::info!(%module, "Respawning worker");
            self.spawn_worker(&mut tasks, &module, &cancel_token, &reporter)?;
        }

        tasks.shutdown().await;
        tracing::info!("Worker pool stopped");
        Ok(())
    }

    fn spawn_worker<WR: WorkerReporter + 'static>(
        &self,
        tasks: &mut JoinSet<WorkerExit>,
        module_name: &str,
        cancel_token: &CancellationToken,
        reporter: &Arc<WR>,
    ) -> Result<(), AppError> {
        let module = self.registry.resolve(module_name)?;
        let mut worker = ScrapeWorker::new(
            module,
            module_name,
            self.configuration.clone(),
            self.keywords.clone(),
            self.resolver.clone(),
            self.pusher.clone(),
            self.metrics.clone(),
            self.config.clone(),
        );
        let name = module_name.to_string();
        let token = cancel_token.clone();
        let reporter = reporter.clone();

        tasks.spawn(async move {
            let result = worker.run(token, reporter.as_ref()).await;
            (name, result)
        });
        Ok(())
    }
}

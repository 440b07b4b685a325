use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use scrapeline_client::{
    ConfigurationProvider, HttpPusher, RandomKeywordSelector, TargetProvider, builtin_registry,
};
use scrapeline_core::{Metrics, ScrapeWorker, TracingWorkerReporter, WorkerPool};
use scrapeline_server::config::{Args, RunMode};
use scrapeline_server::routes;
use scrapeline_server::state::AppState;
use scrapeline_server::supervisor::{self, ShutdownSignals};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(args.trace)?;

    let run_mode = args.run_mode().unwrap_or_else(|e| supervisor::abort(&e));
    match &run_mode {
        RunMode::Single(module) => tracing::info!(
            %module,
            port = args.port,
            "Hello from scrapeline, running module {module}"
        ),
        RunMode::Pool(concurrency) => {
            tracing::info!(port = args.port, "Hello from scrapeline, running a worker pool");
            for (module, count) in concurrency {
                tracing::info!("\t{module} = {count}");
            }
        }
    }
    tracing::info!(
        address_key = %args.target_address_key,
        discovery = args.target_discovery,
        "Items will be pushed to the target named by {}",
        args.target_address_key
    );

    let signals = ShutdownSignals::register().unwrap_or_else(|e| supervisor::abort(&e));
    let shutdown = CancellationToken::new();
    supervisor::spawn_signal_handler(signals, shutdown.clone());

    let config = args
        .loop_config()
        .unwrap_or_else(|e| supervisor::abort(&e));
    let http_timeout = args.http_timeout();

    let registry = builtin_registry(http_timeout).unwrap_or_else(|e| supervisor::abort(&e));
    let configuration =
        ConfigurationProvider::from_url(args.configuration_url.as_deref(), http_timeout)
            .unwrap_or_else(|e| supervisor::abort(&e));
    let resolver = TargetProvider::new(args.target_discovery, http_timeout)
        .unwrap_or_else(|e| supervisor::abort(&e));
    let metrics = Arc::new(Metrics::new());

    match run_mode {
        RunMode::Single(module_name) => {
            let module = registry
                .resolve(&module_name)
                .unwrap_or_else(|e| supervisor::abort(&e));
            let mut worker = ScrapeWorker::new(
                module,
                module_name,
                configuration,
                RandomKeywordSelector::default(),
                resolver,
                HttpPusher::new(http_timeout),
                metrics.clone(),
                config,
            );
            let worker_token = shutdown.clone();
            tokio::spawn(async move {
                match worker.run(worker_token, &TracingWorkerReporter).await {
                    Ok(()) => tracing::info!("Scraping loop stopped"),
                    Err(e) => supervisor::abort(&e),
                }
            });
        }
        RunMode::Pool(concurrency) => {
            let pool = WorkerPool::new(
                registry,
                concurrency,
                configuration,
                RandomKeywordSelector::default(),
                resolver,
                HttpPusher::new(http_timeout),
                metrics.clone(),
                config,
            )
            .unwrap_or_else(|e| supervisor::abort(&e));
            let pool_token = shutdown.clone();
            tokio::spawn(async move {
                if let Err(e) = pool.run(pool_token, Arc::new(TracingWorkerReporter)).await {
                    supervisor::abort(&e);
                }
            });
        }
    }

    let state = Arc::new(AppState { metrics });
    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}

fn init_tracing(trace: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("scrapeline=info".parse()?);

    if trace {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
    Ok(())
}

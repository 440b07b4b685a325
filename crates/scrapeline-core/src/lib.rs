pub mod config;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod models;
pub mod parameters;
pub mod pool;
pub mod registry;
pub mod traits;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::LoopConfig;
pub use dispatch::{DispatchOutcome, DispatchPipeline};
pub use error::AppError;
pub use generator::{ItemGenerator, NextItem};
pub use metrics::{ExpositionFormat, InterruptReason, Metrics};
pub use models::{Item, Parameters, ScraperConfiguration};
pub use parameters::ParameterResolver;
pub use pool::WorkerPool;
pub use registry::ModuleRegistry;
pub use traits::{
    ConfigurationSource, ItemPusher, ItemStream, KeywordSelector, NoTarget, ScraperModule,
    StaticConfiguration, TargetResolver,
};
pub use worker::{ScrapeWorker, TracingWorkerReporter, WorkerEvent, WorkerReporter};

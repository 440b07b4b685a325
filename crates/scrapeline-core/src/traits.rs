use std::future::Future;

use futures::stream::BoxStream;

use crate::error::AppError;
use crate::models::{Item, Parameters, ScraperConfiguration};

/// Stream of items produced by a single `query` call.
pub type ItemStream = BoxStream<'static, Result<Item, AppError>>;

/// A pluggable data source.
///
/// `query` only has to hand back the stream; the actual fetching happens
/// when the stream is polled. Object-safe so modules can live in a registry.
pub trait ScraperModule: Send + Sync {
    fn query(&self, parameters: &Parameters) -> Result<ItemStream, AppError>;
}

/// Fetches the scraper configuration (generic + per-module parameters).
pub trait ConfigurationSource: Send + Sync + Clone {
    fn get_scrapers_configuration(
        &self,
    ) -> impl Future<Output = Result<ScraperConfiguration, AppError>> + Send;
}

/// Picks the keyword a module should scrape for.
pub trait KeywordSelector: Send + Sync + Clone {
    fn choose_keyword(
        &self,
        module_name: &str,
        configuration: &ScraperConfiguration,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Resolves the URL items are delivered to.
pub trait TargetResolver: Send + Sync + Clone {
    /// `Ok(None)` means no target is currently available.
    fn resolve(
        &self,
        service: &str,
        address_key: &str,
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;
}

/// Delivers a single item to a resolved target.
pub trait ItemPusher: Send + Sync + Clone {
    fn push(&self, url: &str, item: &Item) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A configuration source that always returns the same document.
#[derive(Debug, Clone, Default)]
pub struct StaticConfiguration(pub ScraperConfiguration);

impl ConfigurationSource for StaticConfiguration {
    async fn get_scrapers_configuration(&self) -> Result<ScraperConfiguration, AppError> {
        Ok(self.0.clone())
    }
}

/// A target resolver that never finds a target; items are counted and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTarget;

impl TargetResolver for NoTarget {
    async fn resolve(
        &self,
        _service: &str,
        _address_key: &str,
    ) -> Result<Option<String>, AppError> {
        Ok(None)
    }
}

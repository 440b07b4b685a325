//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::dispatch::DispatchOutcome;
use crate::error::AppError;
use crate::models::{Item, Parameters, ScraperConfiguration};
use crate::traits::{
    ConfigurationSource, ItemPusher, ItemStream, KeywordSelector, ScraperModule, TargetResolver,
};
use crate::worker::{WorkerEvent, WorkerReporter};

// ---------------------------------------------------------------------------
// ScriptedModule
// ---------------------------------------------------------------------------

/// One step of a scripted item stream.
#[derive(Debug, Clone)]
pub enum Step {
    Item(serde_json::Value),
    Fail(String),
    /// Never yields again; only a timeout gets past it.
    Stall,
}

/// Module whose every `query` call plays back the next script.
///
/// Once the scripts run out, `query` returns an immediately exhausted stream.
#[derive(Clone)]
pub struct ScriptedModule {
    scripts: Arc<Mutex<VecDeque<Vec<Step>>>>,
    query_error: Arc<Mutex<Option<AppError>>>,
    pub queries: Arc<Mutex<Vec<Parameters>>>,
}

impl ScriptedModule {
    pub fn new(scripts: Vec<Vec<Step>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            query_error: Arc::new(Mutex::new(None)),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_query_error(error: AppError) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(VecDeque::new())),
            query_error: Arc::new(Mutex::new(Some(error))),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl ScraperModule for ScriptedModule {
    fn query(&self, parameters: &Parameters) -> Result<ItemStream, AppError> {
        self.queries.lock().unwrap().push(parameters.clone());
        if let Some(e) = self.query_error.lock().unwrap().take() {
            return Err(e);
        }
        let steps = self.scripts.lock().unwrap().pop_front().unwrap_or_default();

        let stream = futures::stream::unfold(steps.into_iter(), |mut steps| async move {
            match steps.next()? {
                Step::Item(value) => Some((Ok(Item::new(value)), steps)),
                Step::Fail(message) => Some((Err(AppError::StreamError(message)), steps)),
                Step::Stall => {
                    futures::future::pending::<()>().await;
                    None
                }
            }
        });
        Ok(stream.boxed())
    }
}

// ---------------------------------------------------------------------------
// MockConfiguration
// ---------------------------------------------------------------------------

/// Configuration source that fails once with the given error, then returns the default.
#[derive(Clone)]
pub struct MockConfiguration {
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockConfiguration {
    pub fn with_error(error: AppError) -> Self {
        Self {
            error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl ConfigurationSource for MockConfiguration {
    async fn get_scrapers_configuration(&self) -> Result<ScraperConfiguration, AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(ScraperConfiguration::default())
    }
}

// ---------------------------------------------------------------------------
// FixedKeyword
// ---------------------------------------------------------------------------

/// Keyword selector that always picks the same keyword.
#[derive(Clone)]
pub struct FixedKeyword {
    keyword: String,
    error: Arc<Mutex<Option<AppError>>>,
    pub seen_modules: Arc<Mutex<Vec<String>>>,
}

impl FixedKeyword {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            error: Arc::new(Mutex::new(None)),
            seen_modules: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            keyword: String::new(),
            error: Arc::new(Mutex::new(Some(error))),
            seen_modules: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl KeywordSelector for FixedKeyword {
    async fn choose_keyword(
        &self,
        module_name: &str,
        _configuration: &ScraperConfiguration,
    ) -> Result<String, AppError> {
        self.seen_modules
            .lock()
            .unwrap()
            .push(module_name.to_string());
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.keyword.clone())
    }
}

// ---------------------------------------------------------------------------
// MockTargetResolver
// ---------------------------------------------------------------------------

/// Target resolver with a fixed answer that records every lookup.
#[derive(Clone)]
pub struct MockTargetResolver {
    target: Option<String>,
    error: Arc<Mutex<Option<AppError>>>,
    pub lookups: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockTargetResolver {
    pub fn always(target: &str) -> Self {
        Self {
            target: Some(target.to_string()),
            error: Arc::new(Mutex::new(None)),
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn never() -> Self {
        Self {
            target: None,
            error: Arc::new(Mutex::new(None)),
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            target: None,
            error: Arc::new(Mutex::new(Some(error))),
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TargetResolver for MockTargetResolver {
    async fn resolve(&self, service: &str, address_key: &str) -> Result<Option<String>, AppError> {
        self.lookups
            .lock()
            .unwrap()
            .push((service.to_string(), address_key.to_string()));
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.target.clone())
    }
}

// ---------------------------------------------------------------------------
// RecordingPusher
// ---------------------------------------------------------------------------

/// Pusher that records `(url, item)` pairs, optionally failing every push.
#[derive(Clone)]
pub struct RecordingPusher {
    pub pushed: Arc<Mutex<Vec<(String, Item)>>>,
    fail_with: Option<String>,
}

impl RecordingPusher {
    pub fn new() -> Self {
        Self {
            pushed: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(error: AppError) -> Self {
        Self {
            pushed: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(error.to_string()),
        }
    }
}

impl ItemPusher for RecordingPusher {
    async fn push(&self, url: &str, item: &Item) -> Result<(), AppError> {
        self.pushed
            .lock()
            .unwrap()
            .push((url.to_string(), item.clone()));
        match &self.fail_with {
            Some(message) => Err(AppError::HttpError(message.clone())),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that records worker events as short labels.
///
/// With [`cancel_after`](Self::cancel_after) it also cancels the token once
/// the given number of items has been dispatched.
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
    cancel: Option<(CancellationToken, u64)>,
    dispatched: AtomicU64,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cancel: None,
            dispatched: AtomicU64::new(0),
        }
    }

    pub fn cancel_after(token: CancellationToken, dispatched: u64) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cancel: Some((token, dispatched)),
            dispatched: AtomicU64::new(0),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl WorkerReporter for RecordingReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        let label = match event {
            WorkerEvent::Iteration => return,
            WorkerEvent::Started { .. } => "started".to_string(),
            WorkerEvent::GeneratorCreated { .. } => "created".to_string(),
            WorkerEvent::ItemObtained { .. } => "obtained".to_string(),
            WorkerEvent::EmptyItem { .. } => "empty".to_string(),
            WorkerEvent::StreamInterrupted { reason, .. } => format!("interrupted:{reason}"),
            WorkerEvent::ItemDispatched { outcome, .. } => {
                let count = self.dispatched.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some((token, limit)) = &self.cancel {
                    if count >= *limit {
                        token.cancel();
                    }
                }
                match outcome {
                    DispatchOutcome::Delivered { .. } => "dispatched:delivered".to_string(),
                    DispatchOutcome::DeliveryFailed { .. } => "dispatched:failed".to_string(),
                    DispatchOutcome::NoTarget => "dispatched:no_target".to_string(),
                }
            }
            WorkerEvent::Aborted { .. } => "aborted".to_string(),
            WorkerEvent::Stopped {
                items_dispatched, ..
            } => format!("stopped:{items_dispatched}"),
        };
        self.events.lock().unwrap().push(label);
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::AppError;
use crate::traits::ScraperModule;

/// Compiled-in scraper modules, addressed by the name given in configuration.
///
/// Resolution happens once at startup; an unknown name is fatal.
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Arc<dyn ScraperModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any previous one with the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        module: Arc<dyn ScraperModule>,
    ) -> &mut Self {
        self.modules.insert(name.into(), module);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ScraperModule>, AppError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::ModuleNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }
}

use thiserror::Error;

/// Application-wide error types for scrapeline.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No module is registered under the requested name.
    #[error("Unknown scraper module '{0}'")]
    ModuleNotFound(String),

    /// A module refused to start producing items.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A module's item stream failed mid-way.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Keyword selection failed.
    #[error("Keyword selection error: {0}")]
    KeywordError(String),

    /// The generator for a module could not be (re)created.
    #[error("Failed to create generator for module '{module}': {source}")]
    GeneratorCreation {
        module: String,
        #[source]
        source: Box<AppError>,
    },

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error means the deployment is structurally broken
    /// and the process should terminate instead of continuing.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::ModuleNotFound(_)
                | AppError::GeneratorCreation { .. }
                | AppError::ConfigError(_)
        )
    }

    pub fn generator_creation(module: &str, source: AppError) -> Self {
        AppError::GeneratorCreation {
            module: module.to_string(),
            source: Box::new(source),
        }
    }
}

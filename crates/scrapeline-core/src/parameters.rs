use serde_json::{Value, json};

use crate::error::AppError;
use crate::models::Parameters;
use crate::traits::{ConfigurationSource, KeywordSelector};

/// Prefix used to build the canonical reference of a module.
pub const DEFAULT_MODULE_REF_PREFIX: &str = "https://github.com/exorde-labs/";

/// Builds the parameter set passed to a module's `query` entrypoint.
///
/// Precedence, lowest first: keyword base, generic parameters, module-specific
/// parameters. Overlays are shallow: a later top-level key replaces the
/// earlier value wholesale.
#[derive(Clone)]
pub struct ParameterResolver<C, K>
where
    C: ConfigurationSource,
    K: KeywordSelector,
{
    configuration: C,
    keywords: K,
    module_ref_prefix: String,
}

impl<C, K> ParameterResolver<C, K>
where
    C: ConfigurationSource,
    K: KeywordSelector,
{
    pub fn new(configuration: C, keywords: K) -> Self {
        Self {
            configuration,
            keywords,
            module_ref_prefix: DEFAULT_MODULE_REF_PREFIX.to_string(),
        }
    }

    pub fn with_module_ref_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.module_ref_prefix = prefix.into();
        self
    }

    /// Canonical reference under which per-module overrides are stored.
    pub fn module_ref(&self, module_name: &str) -> String {
        format!("{}{}", self.module_ref_prefix, module_name)
    }

    pub async fn resolve(&self, module_name: &str) -> Result<Parameters, AppError> {
        let configuration = self.configuration.get_scrapers_configuration().await?;
        let module_ref = self.module_ref(module_name);

        let keyword = self
            .keywords
            .choose_keyword(module_name, &configuration)
            .await?;

        let mut parameters = Parameters::new();
        parameters.insert("url_parameters".into(), json!({ "keyword": keyword }));
        parameters.insert("keyword".into(), Value::String(keyword));

        overlay(&mut parameters, &configuration.generic_modules_parameters);
        if let Some(specific) = configuration.specific_for(&module_ref) {
            overlay(&mut parameters, specific);
        }

        tracing::debug!(module = %module_name, %module_ref, ?parameters, "Resolved parameters");
        Ok(parameters)
    }
}

fn overlay(base: &mut Parameters, layer: &Parameters) {
    for (key, value) in layer {
        base.insert(key.clone(), value.clone());
    }
}

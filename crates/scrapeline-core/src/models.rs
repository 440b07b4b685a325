use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Flat parameter set handed to a module's `query` entrypoint.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// A single unit of scraped data produced by a module.
///
/// The loop assumes nothing about its shape beyond JSON serializability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(pub serde_json::Value);

impl Item {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Empty items are skipped: never dispatched and never counted.
    ///
    /// `null`, `false`, zero, and the empty string, array or object are empty.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::Bool(b) => !b,
            serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
            serde_json::Value::String(s) => s.is_empty(),
            serde_json::Value::Array(a) => a.is_empty(),
            serde_json::Value::Object(o) => o.is_empty(),
        }
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for Item {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Scraper configuration shared by every module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfiguration {
    /// Parameters applied to every module.
    pub generic_modules_parameters: Parameters,
    /// Per-module overrides keyed by module reference.
    pub specific_modules_parameters: HashMap<String, Parameters>,
    /// Keyword pool used by the keyword selector.
    pub keywords: Vec<String>,
}

impl ScraperConfiguration {
    /// Overrides for a module reference, or `None` if there are none.
    pub fn specific_for(&self, module_ref: &str) -> Option<&Parameters> {
        self.specific_modules_parameters.get(module_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_missing_fields_default_to_empty() {
        let config: ScraperConfiguration = serde_json::from_str("{}").unwrap();
        assert!(config.generic_modules_parameters.is_empty());
        assert!(config.specific_modules_parameters.is_empty());
        assert!(config.keywords.is_empty());
    }

    #[test]
    fn test_configuration_specific_lookup() {
        let config: ScraperConfiguration = serde_json::from_value(serde_json::json!({
            "generic_modules_parameters": {"max_oldness_seconds": 120},
            "specific_modules_parameters": {
                "https://github.com/exorde-labs/rss": {"feeds": 3}
            },
            "keywords": ["bitcoin"]
        }))
        .unwrap();

        let specific = config
            .specific_for("https://github.com/exorde-labs/rss")
            .unwrap();
        assert_eq!(specific["feeds"], 3);
        assert!(config.specific_for("https://github.com/exorde-labs/x").is_none());
        assert_eq!(config.keywords, vec!["bitcoin".to_string()]);
    }

    #[test]
    fn test_falsy_items_are_empty() {
        for value in [
            serde_json::Value::Null,
            serde_json::json!(false),
            serde_json::json!(0),
            serde_json::json!(0.0),
            serde_json::json!(""),
            serde_json::json!([]),
            serde_json::json!({}),
        ] {
            assert!(Item::new(value.clone()).is_empty(), "{value} should be empty");
        }
    }

    #[test]
    fn test_truthy_items_are_not_empty() {
        for value in [
            serde_json::json!({"title": "x"}),
            serde_json::json!([0]),
            serde_json::json!("x"),
            serde_json::json!(true),
            serde_json::json!(-1),
        ] {
            assert!(!Item::new(value.clone()).is_empty(), "{value} should not be empty");
        }
    }

    #[test]
    fn test_item_serializes_transparently() {
        let item = Item::new(serde_json::json!({"title": "x"}));
        assert_eq!(serde_json::to_string(&item).unwrap(), r#"{"title":"x"}"#);
    }
}

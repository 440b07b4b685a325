use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use scrapeline_core::error::AppError;
use scrapeline_core::models::ScraperConfiguration;
use scrapeline_core::traits::KeywordSelector;

pub const DEFAULT_KEYWORD: &str = "bitcoin";

/// Picks a pseudo-random keyword from the configured pool.
///
/// Falls back to a fixed keyword when the configuration carries none.
#[derive(Debug, Clone)]
pub struct RandomKeywordSelector {
    fallback: String,
}

impl Default for RandomKeywordSelector {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD)
    }
}

impl RandomKeywordSelector {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }
}

impl KeywordSelector for RandomKeywordSelector {
    async fn choose_keyword(
        &self,
        module_name: &str,
        configuration: &ScraperConfiguration,
    ) -> Result<String, AppError> {
        let pool: Vec<&str> = configuration
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();

        if pool.is_empty() {
            if self.fallback.is_empty() {
                return Err(AppError::KeywordError(
                    "No keywords configured and no fallback keyword".into(),
                ));
            }
            return Ok(self.fallback.clone());
        }

        let index = (seeded_random(module_name) % pool.len() as u64) as usize;
        let keyword = pool[index].to_string();
        tracing::debug!(module = %module_name, %keyword, "Keyword chosen");
        Ok(keyword)
    }
}

fn seeded_random(seed: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    // Seed from high-resolution clock, good enough for spreading keywords.
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
        ^ hasher.finish();
    // xorshift64
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

use crate::error::{Result, SearchError};
use crate::fusion::DEFAULT_RRF_K;
use crate::language::normalize_code;
use crate::rerank::DEFAULT_COHERE_ENDPOINT;
use hybrid_search_embeddings::EmbeddingConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Which second-stage reranker the hybrid path uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerankerKind {
    /// In-process cross-encoder
    Local,
    /// Cohere rerank API with retry and key fallback
    Remote,
}

impl FromStr for RerankerKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "inhouse" | "in-house" | "local" => Ok(RerankerKind::Local),
            "cohere" | "remote" => Ok(RerankerKind::Remote),
            other => Err(SearchError::UnsupportedBackend(format!(
                "unknown reranker '{other}', expected inhouse or cohere"
            ))),
        }
    }
}

/// Bounded retry with a fixed delay after each failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_secs() -> u64 {
    10 // Cohere trial keys allow 10 calls per minute
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// Remote rerank service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohereConfig {
    #[serde(default = "default_cohere_model")]
    pub model: String,

    #[serde(default = "default_cohere_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Used when a call with `api_key` fails
    #[serde(default)]
    pub secondary_api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_cohere_model() -> String {
    "rerank-v3.5".to_string()
}

fn default_cohere_endpoint() -> String {
    DEFAULT_COHERE_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CohereConfig {
    fn default() -> Self {
        Self {
            model: default_cohere_model(),
            endpoint: default_cohere_endpoint(),
            api_key: None,
            secondary_api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Configuration for [`crate::HybridSearch`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Fuse lexical and dense results and rerank them. Fixed at construction.
    #[serde(default)]
    pub hybrid: bool,

    /// Pin the lexical language instead of detecting it
    #[serde(default)]
    pub language: Option<String>,

    /// Languages the detector chooses from; the first is the fallback
    #[serde(default = "default_candidate_languages")]
    pub candidate_languages: Vec<String>,

    #[serde(default = "default_reranker")]
    pub reranker: RerankerKind,

    #[serde(default)]
    pub cohere: CohereConfig,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Results returned by [`crate::HybridSearch::search`]
    #[serde(default = "default_rows")]
    pub rows: usize,

    /// Candidates fetched from each retriever before fusion
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// RRF constant k (higher = less emphasis on top results)
    #[serde(default = "default_rank_fusion_k")]
    pub rank_fusion_k: u32,

    /// Minimum query length in characters, after trimming
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,

    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Cache size (number of queries to cache)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Print model download progress
    #[serde(default)]
    pub show_download_progress: bool,
}

fn default_candidate_languages() -> Vec<String> {
    vec!["it".to_string(), "en".to_string()]
}

fn default_reranker() -> RerankerKind {
    RerankerKind::Local
}

fn default_rows() -> usize {
    10
}

fn default_top_k() -> usize {
    50
}

fn default_rank_fusion_k() -> u32 {
    DEFAULT_RRF_K
}

fn default_min_query_length() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_cache_size() -> usize {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hybrid: false,
            language: None,
            candidate_languages: default_candidate_languages(),
            reranker: default_reranker(),
            cohere: CohereConfig::default(),
            retry: RetryPolicy::default(),
            embedding: EmbeddingConfig::default(),
            rows: default_rows(),
            top_k: default_top_k(),
            rank_fusion_k: default_rank_fusion_k(),
            min_query_length: default_min_query_length(),
            enable_cache: true,
            cache_size: default_cache_size(),
            show_download_progress: false,
        }
    }
}

impl SearchConfig {
    /// Hybrid search with default settings
    pub fn hybrid() -> Self {
        Self {
            hybrid: true,
            ..Default::default()
        }
    }

    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an environment-style lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            embedding: EmbeddingConfig::from_lookup(&lookup)?,
            ..Default::default()
        };

        if let Some(hybrid) = var("HYBRID_SEARCH") {
            config.hybrid = parse_bool("HYBRID_SEARCH", &hybrid)?;
        }
        config.language = var("SEARCH_LANGUAGE");
        if let Some(reranker) = var("RERANKER") {
            config.reranker = reranker.parse()?;
        }
        if let Some(model) = var("COHERE_RERANK_MODEL") {
            config.cohere.model = model;
        }
        config.cohere.api_key = var("COHERE_API_KEY");
        config.cohere.secondary_api_key = var("COHERE_ALTERNATIVE_API_KEY");

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(language) = &self.language {
            normalize_code(language)?;
        }

        if self.candidate_languages.is_empty() {
            return Err(SearchError::InvalidConfig(
                "candidate_languages cannot be empty".to_string(),
            ));
        }
        for language in &self.candidate_languages {
            normalize_code(language)?;
        }

        if self.rows == 0 {
            return Err(SearchError::InvalidConfig("rows must be > 0".to_string()));
        }

        if self.top_k < self.rows {
            return Err(SearchError::InvalidConfig(format!(
                "top_k ({}) cannot be smaller than rows ({})",
                self.top_k, self.rows
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(SearchError::InvalidConfig(
                "retry.max_attempts must be > 0".to_string(),
            ));
        }

        if self.enable_cache && self.cache_size == 0 {
            return Err(SearchError::InvalidConfig(
                "cache_size must be > 0 when the cache is enabled".to_string(),
            ));
        }

        if self.hybrid {
            self.embedding.validate()?;
        }

        Ok(())
    }

    /// The detector's fallback language
    pub(crate) fn fallback_language(&self) -> &str {
        self.candidate_languages
            .first()
            .map(String::as_str)
            .unwrap_or("en")
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SearchError::InvalidConfig(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_search_embeddings::{EmbeddingBackend, RemoteProvider};
    use pretty_assertions::assert_eq;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.hybrid);
        assert_eq!(config.rows, 10);
        assert_eq!(config.top_k, 50);
        assert_eq!(config.rank_fusion_k, 60);
        assert_eq!(config.candidate_languages, vec!["it", "en"]);
        assert_eq!(config.retry, RetryPolicy { max_attempts: 3, delay_secs: 10 });
        assert_eq!(config.cohere.model, "rerank-v3.5");
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = SearchConfig::from_lookup(lookup_from(&[
            ("HYBRID_SEARCH", "true"),
            ("SEARCH_LANGUAGE", "it"),
            ("RERANKER", "cohere"),
            ("COHERE_API_KEY", "primary"),
            ("COHERE_ALTERNATIVE_API_KEY", "secondary"),
            ("EMBEDDING", "openai"),
            ("EMBEDDING_PROVIDER", "azure"),
            ("OPENAI_AZURE_ENDPOINT", "https://example.openai.azure.com"),
        ]))
        .unwrap();

        assert!(config.hybrid);
        assert_eq!(config.language.as_deref(), Some("it"));
        assert_eq!(config.reranker, RerankerKind::Remote);
        assert_eq!(config.cohere.api_key.as_deref(), Some("primary"));
        assert_eq!(config.cohere.secondary_api_key.as_deref(), Some("secondary"));
        assert_eq!(config.embedding.backend, EmbeddingBackend::Remote);
        assert_eq!(config.embedding.remote.provider, RemoteProvider::Azure);
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = SearchConfig::from_lookup(|_| None).unwrap();
        assert!(!config.hybrid);
        assert_eq!(config.reranker, RerankerKind::Local);
        assert_eq!(config.cohere.api_key, None);
    }

    #[test]
    fn test_unknown_reranker_rejected() {
        let result = SearchConfig::from_lookup(lookup_from(&[("RERANKER", "magic")]));
        assert!(matches!(result, Err(SearchError::UnsupportedBackend(_))));
        assert_eq!("inhouse".parse::<RerankerKind>().unwrap(), RerankerKind::Local);
        assert_eq!("Remote".parse::<RerankerKind>().unwrap(), RerankerKind::Remote);
    }

    #[test]
    fn test_unknown_embedding_backend_rejected() {
        let result = SearchConfig::from_lookup(lookup_from(&[("EMBEDDING", "word2vec")]));
        assert!(matches!(result, Err(SearchError::Embedding(_))));
    }

    #[test]
    fn test_invalid_values() {
        let bad_bool = SearchConfig::from_lookup(lookup_from(&[("HYBRID_SEARCH", "maybe")]));
        assert!(matches!(bad_bool, Err(SearchError::InvalidConfig(_))));

        let bad_language = SearchConfig {
            language: Some("xx".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            bad_language.validate(),
            Err(SearchError::UnsupportedLanguage(_))
        ));

        let rows_over_top_k = SearchConfig {
            rows: 20,
            top_k: 10,
            ..Default::default()
        };
        assert!(rows_over_top_k.validate().is_err());

        let no_attempts = SearchConfig {
            retry: RetryPolicy {
                max_attempts: 0,
                delay_secs: 1,
            },
            ..Default::default()
        };
        assert!(no_attempts.validate().is_err());
    }

    #[test]
    fn test_serde_defaults() {
        let config: SearchConfig = serde_json::from_str(r#"{"hybrid": true, "rows": 5}"#).unwrap();
        assert!(config.hybrid);
        assert_eq!(config.rows, 5);
        assert_eq!(config.top_k, 50);
        assert_eq!(config.reranker, RerankerKind::Local);
    }
}

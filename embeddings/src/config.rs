use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REMOTE_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

/// Which embedding backend computes vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Locally hosted sentence embedding model
    Local,
    /// Remote OpenAI-compatible embedding API
    Remote,
}

impl FromStr for EmbeddingBackend {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "sentence-transformers" | "fastembed" => Ok(Self::Local),
            "remote" | "openai" => Ok(Self::Remote),
            other => Err(EmbeddingError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// Supported local models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalModel {
    /// paraphrase-multilingual-mpnet-base-v2 (multilingual, recommended)
    ParaphraseMultilingualMpnetBaseV2,
    /// all-MiniLM-L6-v2 (English, lightweight)
    AllMiniLmL6V2,
    /// nomic-embed-text-v1.5
    NomicEmbedTextV15,
}

impl LocalModel {
    /// Output dimension of the model
    pub fn dimension(self) -> usize {
        match self {
            LocalModel::ParaphraseMultilingualMpnetBaseV2 => 768,
            LocalModel::AllMiniLmL6V2 => 384,
            LocalModel::NomicEmbedTextV15 => 768,
        }
    }
}

impl FromStr for LocalModel {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let name = name
            .strip_prefix("sentence-transformers/")
            .or_else(|| name.strip_prefix("nomic-ai/"))
            .unwrap_or(&name);
        match name {
            "paraphrase-multilingual-mpnet-base-v2" => Ok(Self::ParaphraseMultilingualMpnetBaseV2),
            "all-minilm-l6-v2" => Ok(Self::AllMiniLmL6V2),
            "nomic-embed-text-v1.5" => Ok(Self::NomicEmbedTextV15),
            other => Err(EmbeddingError::UnsupportedBackend(format!(
                "local model {other}"
            ))),
        }
    }
}

/// Flavour of the remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteProvider {
    /// api.openai.com (or any compatible base URL), bearer auth
    OpenAi,
    /// Azure OpenAI deployment, `api-key` header auth
    Azure,
}

impl FromStr for RemoteProvider {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure" => Ok(Self::Azure),
            other => Err(EmbeddingError::UnsupportedBackend(format!(
                "remote provider {other}"
            ))),
        }
    }
}

/// Settings for the local backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalEmbeddingConfig {
    #[serde(default = "default_local_model")]
    pub model: LocalModel,

    /// Maximum batch size handed to the model
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Show download progress when fetching model files
    #[serde(default)]
    pub show_download_progress: bool,
}

impl Default for LocalEmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_local_model(),
            batch_size: default_batch_size(),
            show_download_progress: false,
        }
    }
}

/// Settings for the remote backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: RemoteProvider,

    #[serde(default = "default_remote_model")]
    pub model: String,

    /// Custom output dimension; sent with every request when set
    #[serde(default)]
    pub dimensions: Option<usize>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the `openai` provider
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Resource endpoint for the `azure` provider
    #[serde(default)]
    pub azure_endpoint: Option<String>,

    /// `api-version` query parameter for the `azure` provider
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Maximum number of inputs per request
    #[serde(default = "default_remote_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteEmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_remote_model(),
            dimensions: None,
            api_key: None,
            base_url: default_base_url(),
            azure_endpoint: None,
            api_version: default_api_version(),
            batch_size: default_remote_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteEmbeddingConfig {
    /// Output dimension: the custom value, or the known size of the model
    pub fn resolved_dimension(&self) -> Result<usize, EmbeddingError> {
        if let Some(dimensions) = self.dimensions {
            return Ok(dimensions);
        }
        match self.model.as_str() {
            "text-embedding-3-small" | "text-embedding-ada-002" => Ok(1536),
            "text-embedding-3-large" => Ok(3072),
            other => Err(EmbeddingError::Config(format!(
                "unknown dimension for model {other}; set dimensions explicitly"
            ))),
        }
    }
}

/// Configuration for the embedding service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_backend")]
    pub backend: EmbeddingBackend,

    #[serde(default)]
    pub local: LocalEmbeddingConfig,

    #[serde(default)]
    pub remote: RemoteEmbeddingConfig,
}

fn default_backend() -> EmbeddingBackend {
    EmbeddingBackend::Remote
}

fn default_local_model() -> LocalModel {
    LocalModel::ParaphraseMultilingualMpnetBaseV2
}

fn default_batch_size() -> usize {
    32
}

fn default_provider() -> RemoteProvider {
    RemoteProvider::OpenAi
}

fn default_remote_model() -> String {
    DEFAULT_REMOTE_MODEL.to_string()
}

fn default_base_url() -> String {
    OPENAI_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_AZURE_API_VERSION.to_string()
}

fn default_remote_batch_size() -> usize {
    64
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local: LocalEmbeddingConfig::default(),
            remote: RemoteEmbeddingConfig::default(),
        }
    }
}

impl EmbeddingConfig {
    /// Config using the local backend with default settings
    pub fn local() -> Self {
        Self {
            backend: EmbeddingBackend::Local,
            ..Default::default()
        }
    }

    /// Build a config from environment-style variables.
    ///
    /// `lookup` returns the raw value of a variable; blank values count as
    /// unset. Recognised keys: `EMBEDDING`, `SENTENCE_TRANSFORMER_MODEL`,
    /// `EMBEDDING_PROVIDER`, `OPENAI_API_KEY`, `OPENAI_EMBEDDING_MODEL`,
    /// `OPENAI_EMBEDDING_DIMENSIONS`, `OPENAI_BASE_URL`, `OPENAI_API_VERSION`,
    /// `OPENAI_AZURE_ENDPOINT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EmbeddingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(backend) = var("EMBEDDING") {
            config.backend = backend.parse()?;
        }
        if let Some(model) = var("SENTENCE_TRANSFORMER_MODEL") {
            config.local.model = model.parse()?;
        }
        if let Some(provider) = var("EMBEDDING_PROVIDER") {
            config.remote.provider = provider.parse()?;
        }
        if let Some(model) = var("OPENAI_EMBEDDING_MODEL") {
            config.remote.model = model;
        }
        if let Some(dimensions) = var("OPENAI_EMBEDDING_DIMENSIONS") {
            let parsed = dimensions.parse::<usize>().map_err(|_| {
                EmbeddingError::Config(format!(
                    "OPENAI_EMBEDDING_DIMENSIONS must be a positive integer, got {dimensions}"
                ))
            })?;
            config.remote.dimensions = Some(parsed);
        }
        if let Some(base_url) = var("OPENAI_BASE_URL") {
            config.remote.base_url = base_url;
        }
        if let Some(version) = var("OPENAI_API_VERSION") {
            config.remote.api_version = version;
        }
        config.remote.api_key = var("OPENAI_API_KEY");
        config.remote.azure_endpoint = var("OPENAI_AZURE_ENDPOINT");

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        match self.backend {
            EmbeddingBackend::Local => {
                if self.local.batch_size == 0 {
                    return Err(EmbeddingError::Config("batch_size must be > 0".into()));
                }
            }
            EmbeddingBackend::Remote => {
                let remote = &self.remote;
                if remote.batch_size == 0 {
                    return Err(EmbeddingError::Config("batch_size must be > 0".into()));
                }
                if remote.dimensions == Some(0) {
                    return Err(EmbeddingError::Config("dimensions must be > 0".into()));
                }
                remote.resolved_dimension()?;
                if remote.provider == RemoteProvider::Azure && remote.azure_endpoint.is_none() {
                    return Err(EmbeddingError::Config(
                        "azure provider requires an endpoint".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

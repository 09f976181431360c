//! Remote embedding backend for OpenAI-compatible APIs.
//!
//! Two endpoint flavours are supported:
//! - `openai`: `{base_url}/embeddings` with bearer authentication
//! - `azure`: `{endpoint}/openai/deployments/{model}/embeddings?api-version=...`
//!   with an `api-key` header

use crate::Embedder;
use crate::config::{RemoteEmbeddingConfig, RemoteProvider};
use crate::error::EmbeddingError;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedding request body
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

/// Embedding response body
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Error envelope returned by OpenAI-style APIs
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Embedder backed by a remote HTTP API
#[derive(Debug)]
pub struct RemoteEmbedder {
    client: Client,
    config: RemoteEmbeddingConfig,
    dimension: usize,
}

impl RemoteEmbedder {
    pub fn new(config: RemoteEmbeddingConfig) -> Result<Self, EmbeddingError> {
        let dimension = config.resolved_dimension()?;
        if config.batch_size == 0 {
            return Err(EmbeddingError::Config("batch_size must be > 0".into()));
        }
        if config.api_key.is_none() {
            warn!("No API key configured for remote embeddings");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(
            "Initialized remote embedder: provider={:?}, model={}, {} dimensions",
            config.provider, config.model, dimension
        );

        Ok(Self {
            client,
            config,
            dimension,
        })
    }

    fn endpoint(&self) -> Result<String, EmbeddingError> {
        match self.config.provider {
            RemoteProvider::OpenAi => Ok(format!(
                "{}/embeddings",
                self.config.base_url.trim_end_matches('/')
            )),
            RemoteProvider::Azure => {
                let endpoint = self.config.azure_endpoint.as_deref().ok_or_else(|| {
                    EmbeddingError::Config("azure provider requires an endpoint".into())
                })?;
                Ok(format!(
                    "{}/openai/deployments/{}/embeddings?api-version={}",
                    endpoint.trim_end_matches('/'),
                    self.config.model,
                    self.config.api_version
                ))
            }
        }
    }

    async fn request_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
            dimensions: self.config.dimensions,
        };
        let url = self.endpoint()?;

        debug!("Sending embedding request to {url} for {} texts", texts.len());

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = match self.config.provider {
                RemoteProvider::OpenAi => request.bearer_auth(key),
                RemoteProvider::Azure => request.header("api-key", key),
            };
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::EmbeddingGeneration(format!(
                "API returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);

        let mut embeddings = Vec::with_capacity(parsed.data.len());
        for data in parsed.data {
            if data.embedding.len() != self.dimension {
                return Err(EmbeddingError::EmbeddingGeneration(format!(
                    "expected {} dimensions, got {}",
                    self.dimension,
                    data.embedding.len()
                )));
            }
            embeddings.push(data.embedding);
        }
        Ok(embeddings)
    }

    /// Get the configuration of this embedder
    pub fn config(&self) -> &RemoteEmbeddingConfig {
        &self.config
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.is_empty()) {
            return Err(EmbeddingError::InvalidInput(
                "remote embeddings require non-empty texts".into(),
            ));
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            all_embeddings.extend(self.request_batch(batch).await?);
        }

        debug!("Generated {} remote embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        match self.config.provider {
            RemoteProvider::OpenAi => "openai",
            RemoteProvider::Azure => "azure",
        }
    }
}

use crate::Embedder;
use crate::config::{LocalEmbeddingConfig, LocalModel};
use crate::error::EmbeddingError;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use log::{debug, info};

impl LocalModel {
    fn to_fastembed_model(self) -> EmbeddingModel {
        match self {
            LocalModel::ParaphraseMultilingualMpnetBaseV2 => EmbeddingModel::ParaphraseMLMpnetBaseV2,
            LocalModel::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            LocalModel::NomicEmbedTextV15 => EmbeddingModel::NomicEmbedTextV15,
        }
    }
}

/// Sentence embedding model running in-process via fastembed (ONNX Runtime)
pub struct LocalEmbedder {
    model: TextEmbedding,
    config: LocalEmbeddingConfig,
}

impl LocalEmbedder {
    /// Create a local embedder with the default multilingual model
    pub async fn new() -> Result<Self, EmbeddingError> {
        Self::with_config(LocalEmbeddingConfig::default()).await
    }

    /// Create a local embedder with custom configuration
    pub async fn with_config(config: LocalEmbeddingConfig) -> Result<Self, EmbeddingError> {
        info!(
            "Initializing local embedding model {:?} ({} dimensions)",
            config.model,
            config.model.dimension()
        );

        let init_options = InitOptions::new(config.model.to_fastembed_model())
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(init_options).map_err(|e| {
            EmbeddingError::ModelInitialization(format!("Failed to initialize model: {e}"))
        })?;

        info!("Local embedding model initialized successfully");

        Ok(Self { model, config })
    }

    /// Get the configuration of this embedder
    pub fn config(&self) -> &LocalEmbeddingConfig {
        &self.config
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating local embeddings for {} texts", texts.len());

        let embeddings = self
            .model
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e| EmbeddingError::EmbeddingGeneration(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::EmbeddingGeneration(format!(
                "model returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.config.model.dimension()
    }

    fn name(&self) -> &str {
        "local"
    }
}

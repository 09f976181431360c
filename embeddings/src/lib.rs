//! # Hybrid Search Embeddings
//!
//! Text embedding backends for dense retrieval.
//!
//! Two backends implement the [`Embedder`] trait:
//!
//! - [`LocalEmbedder`]: a sentence embedding model running in-process via
//!   fastembed (default `paraphrase-multilingual-mpnet-base-v2`)
//! - [`RemoteEmbedder`]: an OpenAI-compatible HTTP API, either api.openai.com
//!   or an Azure OpenAI deployment
//!
//! The dimension of a backend is fixed once it is constructed.
//!
//! ## Example
//!
//! ```no_run
//! use hybrid_search_embeddings::{EmbeddingConfig, create_embedder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let embedder = create_embedder(&EmbeddingConfig::local()).await?;
//!     let texts = vec!["Il gatto dorme sul divano.".to_string()];
//!     let embeddings = embedder.embed(&texts).await?;
//!     assert_eq!(embeddings[0].len(), embedder.dimension());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod local;
mod remote;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;

pub use config::{
    EmbeddingBackend, EmbeddingConfig, LocalEmbeddingConfig, LocalModel, RemoteEmbeddingConfig,
    RemoteProvider,
};
pub use error::EmbeddingError;
pub use local::LocalEmbedder;
pub use remote::RemoteEmbedder;

/// A function from texts to fixed-size vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text
    async fn embed_single(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embeddings = self.embed(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::EmbeddingGeneration("No embedding generated".into()))
    }

    /// Length of every vector this backend produces
    fn dimension(&self) -> usize;

    /// Short backend name for logging
    fn name(&self) -> &str;
}

/// Build the backend selected by `config`
pub async fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    config.validate()?;
    info!("Creating {:?} embedding backend", config.backend);

    let embedder: Arc<dyn Embedder> = match config.backend {
        EmbeddingBackend::Local => Arc::new(LocalEmbedder::with_config(config.local.clone()).await?),
        EmbeddingBackend::Remote => Arc::new(RemoteEmbedder::new(config.remote.clone())?),
    };
    Ok(embedder)
}

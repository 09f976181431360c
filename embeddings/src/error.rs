use thiserror::Error;

/// Errors that can occur during embedding operations
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Failed to initialize the embedding model
    #[error("Failed to initialize embedding model: {0}")]
    ModelInitialization(String),

    /// Failed to generate embeddings
    #[error("Failed to generate embeddings: {0}")]
    EmbeddingGeneration(String),

    /// Invalid input provided to embedding service
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown backend, provider or model selector
    #[error("Unsupported embedding backend: {0}")]
    UnsupportedBackend(String),

    /// Incomplete or inconsistent configuration
    #[error("Invalid embedding configuration: {0}")]
    Config(String),

    /// Transport failure talking to a remote endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status
    #[error("Embedding API returned {status}: {message}")]
    Api { status: u16, message: String },
}

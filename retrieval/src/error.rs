use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Query too short: minimum {min} characters, got {actual}")]
    QueryTooShort { min: usize, actual: usize },

    #[error("Embedding error: {0}")]
    Embedding(#[from] hybrid_search_embeddings::EmbeddingError),

    #[error("Vector index error: {0}")]
    VectorStore(#[from] hybrid_search_vector_store::VectorStoreError),

    #[error("Reranking error: {0}")]
    Reranking(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Failure of a single call to a remote rerank service
#[derive(Error, Debug)]
pub enum RerankError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rerank service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Rerank result index {index} out of range for {len} documents")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No API key configured")]
    MissingCredential,
}

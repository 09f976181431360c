use thiserror::Error;

/// Errors that can occur during vector index operations
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// A vector's length does not match the index dimension
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The index was created with a zero dimension
    #[error("Invalid index dimension: {0}")]
    InvalidDimension(usize),
}

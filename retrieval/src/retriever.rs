use crate::document::{Document, DocumentId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry of a ranked list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: DocumentId,

    /// Relevance score when the retriever exposes one
    pub score: Option<f32>,
}

/// A first-stage retrieval system over an append-only document sequence.
///
/// Implementations keep their own id list aligned with their index, so a
/// position in the index always maps back to the document appended there.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `top_k` hits, best first.
    ///
    /// Fewer hits come back when the corpus is smaller, and also when an
    /// implementation only reports documents with a positive relevance
    /// (the lexical retriever drops documents sharing no query term).
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Hit>>;

    /// Append documents in the given order
    async fn add(&mut self, documents: &[Document]) -> Result<()>;

    /// Number of indexed documents
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn name(&self) -> &str;
}

/// Ids of a ranked list, in rank order
pub fn ids(hits: &[Hit]) -> Vec<DocumentId> {
    hits.iter().map(|hit| hit.id.clone()).collect()
}

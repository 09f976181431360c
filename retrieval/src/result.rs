use crate::document::Document;
use serde::{Deserialize, Serialize};

/// Whether and how the returned order was produced by a reranker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RerankStatus {
    /// Lexical-only search, no reranking stage
    NotApplied,
    /// Reranked with the primary model or credential
    Reranked,
    /// Reranked with the secondary credential
    FallbackReranked,
    /// The reranker was unavailable; documents are in fusion order
    Degraded,
}

/// Search performance statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Total search time in milliseconds
    pub total_time_ms: u64,

    /// Lexical retrieval time in milliseconds
    pub lexical_time_ms: u64,

    /// Dense retrieval time in milliseconds
    pub vector_time_ms: u64,

    /// Fusion time in milliseconds
    pub fusion_time_ms: u64,

    /// Reranking time in milliseconds
    pub rerank_time_ms: u64,

    /// Number of lexical candidates
    pub lexical_count: usize,

    /// Number of dense candidates
    pub vector_count: usize,

    /// Number of fused candidates before truncation
    pub fused_count: usize,

    /// Cache hit
    pub cache_hit: bool,
}

/// Documents returned by a search, best first.
///
/// `scores` are advisory: on the hybrid path they are the fusion scores of
/// the first `rows` fused candidates, while `documents` follow the reranked
/// order. On the lexical path they are the BM25 scores of `documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query that produced these results
    pub query: String,

    pub documents: Vec<Document>,

    pub scores: Vec<f64>,

    pub rerank_status: RerankStatus,

    pub stats: SearchStats,
}

impl SearchResults {
    pub fn new(query: String) -> Self {
        Self {
            query,
            documents: Vec::new(),
            scores: Vec::new(),
            rerank_status: RerankStatus::NotApplied,
            stats: SearchStats::default(),
        }
    }

    pub fn with_documents(mut self, documents: Vec<Document>, scores: Vec<f64>) -> Self {
        self.documents = documents;
        self.scores = scores;
        self
    }

    pub fn with_rerank_status(mut self, status: RerankStatus) -> Self {
        self.rerank_status = status;
        self
    }

    pub fn with_stats(mut self, stats: SearchStats) -> Self {
        self.stats = stats;
        self
    }

    /// True when the reranker could not score and the order is unreranked
    pub fn is_degraded(&self) -> bool {
        self.rerank_status == RerankStatus::Degraded
    }

    /// Ids of the returned documents, in order
    pub fn ids(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.id().as_str()).collect()
    }

    /// Get top N results
    pub fn top(&self, n: usize) -> &[Document] {
        &self.documents[..n.min(self.documents.len())]
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
}

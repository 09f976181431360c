//! Second-stage rerankers.
//!
//! A reranker scores a small candidate set against the query and returns the
//! candidates in its own order. The remote variant never fails: when the
//! service stays unavailable it returns a [`RerankOutcome::Degraded`] list.

mod cohere;
mod local;
mod remote;

pub use cohere::{CohereClient, DEFAULT_COHERE_ENDPOINT};
pub use local::LocalReranker;
pub use remote::{RelevanceScore, RemoteReranker, RerankClient};

use crate::document::{Document, DocumentId};
use crate::error::Result;
use crate::result::RerankStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A document id with the score a reranker gave it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: DocumentId,
    pub score: f32,
}

/// How a rerank call ended
#[derive(Debug, Clone, PartialEq)]
pub enum RerankOutcome {
    /// Scored with the primary model or credential
    Reranked(Vec<ScoredDocument>),
    /// Scored with the secondary credential after the primary failed
    FallbackReranked(Vec<ScoredDocument>),
    /// Not scored: every candidate in input order with score 0
    Degraded(Vec<ScoredDocument>),
}

impl RerankOutcome {
    pub fn status(&self) -> RerankStatus {
        match self {
            RerankOutcome::Reranked(_) => RerankStatus::Reranked,
            RerankOutcome::FallbackReranked(_) => RerankStatus::FallbackReranked,
            RerankOutcome::Degraded(_) => RerankStatus::Degraded,
        }
    }

    pub fn scored(&self) -> &[ScoredDocument] {
        match self {
            RerankOutcome::Reranked(scored)
            | RerankOutcome::FallbackReranked(scored)
            | RerankOutcome::Degraded(scored) => scored,
        }
    }

    pub fn into_scored(self) -> Vec<ScoredDocument> {
        match self {
            RerankOutcome::Reranked(scored)
            | RerankOutcome::FallbackReranked(scored)
            | RerankOutcome::Degraded(scored) => scored,
        }
    }

    /// Zero-scored candidates in input order
    pub(crate) fn degraded(documents: &[&Document]) -> Self {
        RerankOutcome::Degraded(
            documents
                .iter()
                .map(|doc| ScoredDocument {
                    id: doc.id().clone(),
                    score: 0.0,
                })
                .collect(),
        )
    }
}

/// Pairwise relevance scorer applied to a short candidate list
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(&self, query: &str, documents: &[&Document]) -> Result<RerankOutcome>;

    fn name(&self) -> &str;
}

/// Pair each `(index, score)` with its document and sort by descending score.
///
/// Equal scores keep the order they were given in.
pub(crate) fn order_by_score(
    documents: &[&Document],
    scores: impl IntoIterator<Item = (usize, f32)>,
) -> Vec<ScoredDocument> {
    let mut scored: Vec<ScoredDocument> = scores
        .into_iter()
        .filter_map(|(index, score)| {
            documents.get(index).map(|doc| ScoredDocument {
                id: doc.id().clone(),
                score,
            })
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

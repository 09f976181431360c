use super::{RerankOutcome, Reranker, order_by_score};
use crate::document::Document;
use crate::error::{Result, SearchError};
use async_trait::async_trait;
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use log::{debug, info};

/// Cross-encoder running in-process (jina-reranker-v2-base-multilingual).
///
/// Model load and inference errors are returned as is, without retries.
pub struct LocalReranker {
    model: TextRerank,
    batch_size: Option<usize>,
}

impl LocalReranker {
    pub fn new(show_download_progress: bool) -> Result<Self> {
        info!("Loading local reranker model jina-reranker-v2-base-multilingual");
        let options = RerankInitOptions::new(RerankerModel::JINARerankerV2BaseMultiligual)
            .with_show_download_progress(show_download_progress);
        let model = TextRerank::try_new(options)
            .map_err(|e| SearchError::Reranking(format!("Failed to load reranker model: {e}")))?;

        Ok(Self {
            model,
            batch_size: None,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

#[async_trait]
impl Reranker for LocalReranker {
    async fn rerank(&self, query: &str, documents: &[&Document]) -> Result<RerankOutcome> {
        if documents.is_empty() {
            return Ok(RerankOutcome::Reranked(Vec::new()));
        }

        let texts: Vec<String> = documents.iter().map(|d| d.searchable_text()).collect();
        let results = self
            .model
            .rerank(
                query,
                texts.iter().map(String::as_str).collect(),
                false,
                self.batch_size,
            )
            .map_err(|e| SearchError::Reranking(e.to_string()))?;

        debug!("Local reranker scored {} documents", results.len());
        Ok(RerankOutcome::Reranked(order_by_score(
            documents,
            results.into_iter().map(|r| (r.index, r.score)),
        )))
    }

    fn name(&self) -> &str {
        "local"
    }
}

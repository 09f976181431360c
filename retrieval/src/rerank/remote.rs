use super::{RerankOutcome, Reranker, ScoredDocument, order_by_score};
use crate::config::RetryPolicy;
use crate::document::Document;
use crate::error::{RerankError, Result};
use async_trait::async_trait;
use log::{error, info, warn};
use std::result::Result as StdResult;

/// Relevance of the document at `index` in the request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceScore {
    pub index: usize,
    pub score: f32,
}

/// One call to a remote rerank service with a given credential
#[async_trait]
pub trait RerankClient: Send + Sync {
    async fn score(
        &self,
        api_key: &str,
        query: &str,
        documents: &[String],
    ) -> StdResult<Vec<RelevanceScore>, RerankError>;

    fn name(&self) -> &str;
}

/// Which credential produced a successful call
enum Credential {
    Primary,
    Secondary,
}

/// Reranker backed by a remote service.
///
/// Each attempt calls the service with the primary key and, if that fails
/// and a secondary key is configured, once more with the secondary key. A
/// failed attempt is followed by the policy delay. After the last attempt
/// the candidates come back unscored as [`RerankOutcome::Degraded`].
pub struct RemoteReranker<C> {
    client: C,
    primary_key: Option<String>,
    secondary_key: Option<String>,
    policy: RetryPolicy,
}

impl<C: RerankClient> RemoteReranker<C> {
    pub fn new(
        client: C,
        primary_key: Option<String>,
        secondary_key: Option<String>,
        policy: RetryPolicy,
    ) -> Self {
        if primary_key.is_none() {
            warn!("Remote reranker has no primary API key, calls will fail");
        }
        if secondary_key.is_some() {
            info!("Remote reranker has a secondary API key for fallback");
        }
        Self {
            client,
            primary_key,
            secondary_key,
            policy,
        }
    }

    async fn call(
        &self,
        key: Option<&str>,
        query: &str,
        texts: &[String],
    ) -> StdResult<Vec<RelevanceScore>, RerankError> {
        let key = key.ok_or(RerankError::MissingCredential)?;
        let scores = self.client.score(key, query, texts).await?;
        if let Some(bad) = scores.iter().find(|s| s.index >= texts.len()) {
            return Err(RerankError::IndexOutOfRange {
                index: bad.index,
                len: texts.len(),
            });
        }
        Ok(scores)
    }

    /// One attempt: primary, then secondary if configured
    async fn attempt(
        &self,
        query: &str,
        texts: &[String],
    ) -> StdResult<(Credential, Vec<RelevanceScore>), RerankError> {
        match self.call(self.primary_key.as_deref(), query, texts).await {
            Ok(scores) => Ok((Credential::Primary, scores)),
            Err(primary_err) => {
                error!("Rerank call with primary key failed: {primary_err}");
                let Some(secondary) = self.secondary_key.as_deref() else {
                    return Err(primary_err);
                };
                info!("Retrying rerank call with secondary key");
                let scores = self.call(Some(secondary), query, texts).await?;
                Ok((Credential::Secondary, scores))
            }
        }
    }
}

#[async_trait]
impl<C: RerankClient> Reranker for RemoteReranker<C> {
    async fn rerank(&self, query: &str, documents: &[&Document]) -> Result<RerankOutcome> {
        if documents.is_empty() {
            return Ok(RerankOutcome::Reranked(Vec::new()));
        }

        let texts: Vec<String> = documents.iter().map(|d| d.searchable_text()).collect();

        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(query, &texts).await {
                Ok((credential, scores)) => {
                    let scored: Vec<ScoredDocument> = order_by_score(
                        documents,
                        scores.into_iter().map(|s| (s.index, s.score)),
                    );
                    return Ok(match credential {
                        Credential::Primary => RerankOutcome::Reranked(scored),
                        Credential::Secondary => RerankOutcome::FallbackReranked(scored),
                    });
                }
                Err(e) => {
                    error!(
                        "Rerank attempt {attempt}/{} failed: {e}",
                        self.policy.max_attempts
                    );
                    tokio::time::sleep(self.policy.delay()).await;
                }
            }
        }

        error!(
            "Rerank service unavailable after {} attempts, returning {} documents unscored",
            self.policy.max_attempts,
            documents.len()
        );
        Ok(RerankOutcome::degraded(documents))
    }

    fn name(&self) -> &str {
        self.client.name()
    }
}

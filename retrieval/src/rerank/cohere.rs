use super::remote::{RelevanceScore, RerankClient};
use crate::error::RerankError;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_COHERE_ENDPOINT: &str = "https://api.cohere.com/v2/rerank";

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

/// Client for the Cohere v2 rerank endpoint
#[derive(Debug, Clone)]
pub struct CohereClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl CohereClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RerankError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl RerankClient for CohereClient {
    async fn score(
        &self,
        api_key: &str,
        query: &str,
        documents: &[String],
    ) -> Result<Vec<RelevanceScore>, RerankError> {
        let body = RerankRequest {
            model: &self.model,
            query,
            documents,
        };
        debug!(
            "Sending rerank request for {} documents to {}",
            documents.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RerankError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: RerankResponse = response.json().await?;
        Ok(parsed
            .results
            .into_iter()
            .map(|r| RelevanceScore {
                index: r.index,
                score: r.relevance_score,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "cohere"
    }
}

use crate::config::{RerankerKind, SearchConfig};
use crate::corpus::Corpus;
use crate::document::{Document, DocumentInput, normalize};
use crate::error::{Result, SearchError};
use crate::fusion::reciprocal_rank_fusion;
use crate::language::{LanguageDetector, LinguaDetector};
use crate::lexical::LexicalRetriever;
use crate::rerank::{CohereClient, LocalReranker, RemoteReranker, Reranker};
use crate::result::{CacheStats, RerankStatus, SearchResults, SearchStats};
use crate::retriever::{Retriever, ids};
use crate::vector::VectorRetriever;
use hybrid_search_embeddings::{Embedder, create_embedder};
use log::{debug, info, warn};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Per-call search parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchParams {
    /// Documents to return
    pub rows: usize,
    /// Candidates fetched from each retriever
    pub top_k: usize,
    /// RRF constant
    pub rank_fusion_k: u32,
}

impl SearchParams {
    pub fn new(rows: usize, top_k: usize, rank_fusion_k: u32) -> Self {
        Self {
            rows,
            top_k,
            rank_fusion_k,
        }
    }
}

impl From<&SearchConfig> for SearchParams {
    fn from(config: &SearchConfig) -> Self {
        Self::new(config.rows, config.top_k, config.rank_fusion_k)
    }
}

/// Collaborators to use instead of the ones `SearchConfig` would build
#[derive(Default, Clone)]
pub struct Backends {
    pub detector: Option<Arc<dyn LanguageDetector>>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub reranker: Option<Arc<dyn Reranker>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    params: SearchParams,
}

/// Dense retrieval and reranking, present only in hybrid mode
struct DenseStage {
    vector: VectorRetriever,
    reranker: Arc<dyn Reranker>,
}

/// Hybrid search engine combining BM25 and dense retrieval.
///
/// `add_documents` takes `&mut self` and `search` takes `&self`, so adding
/// can never overlap a search on the same instance.
pub struct HybridSearch {
    config: SearchConfig,
    corpus: Corpus,
    lexical: LexicalRetriever,
    dense: Option<DenseStage>,
    cache: Option<RwLock<LruCache<CacheKey, SearchResults>>>,
}

impl HybridSearch {
    /// Create the engine, loading every collaborator the config selects
    pub async fn new<I, D>(config: SearchConfig, documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<DocumentInput>,
    {
        Self::with_backends(config, documents, Backends::default()).await
    }

    /// Create the engine with some collaborators supplied by the caller
    pub async fn with_backends<I, D>(
        config: SearchConfig,
        documents: I,
        backends: Backends,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<DocumentInput>,
    {
        config.validate()?;
        let documents = normalize(documents)?;

        info!(
            "Initializing hybrid search: {} documents, hybrid={}",
            documents.len(),
            config.hybrid
        );

        let detector = match backends.detector {
            Some(detector) => detector,
            None => Arc::new(LinguaDetector::new(&config.candidate_languages)?),
        };
        let lexical = LexicalRetriever::new(
            &documents,
            config.language.as_deref(),
            detector,
            config.fallback_language(),
        )?;

        let dense = if config.hybrid {
            let embedder = match backends.embedder {
                Some(embedder) => embedder,
                None => create_embedder(&config.embedding).await?,
            };
            let reranker = match backends.reranker {
                Some(reranker) => reranker,
                None => build_reranker(&config)?,
            };
            info!(
                "Dense stage: embedder '{}', reranker '{}'",
                embedder.name(),
                reranker.name()
            );
            Some(DenseStage {
                vector: VectorRetriever::new(&documents, embedder).await?,
                reranker,
            })
        } else {
            None
        };

        let cache = if config.enable_cache {
            let size = NonZeroUsize::new(config.cache_size).ok_or_else(|| {
                SearchError::InvalidConfig("cache_size must be > 0".to_string())
            })?;
            Some(RwLock::new(LruCache::new(size)))
        } else {
            None
        };

        Ok(Self {
            config,
            corpus: Corpus::new(documents),
            lexical,
            dense,
            cache,
        })
    }

    /// Append documents to the corpus and to every active retriever
    pub async fn add_documents<I, D>(&mut self, documents: I) -> Result<()>
    where
        I: IntoIterator<Item = D>,
        D: Into<DocumentInput>,
    {
        let documents = normalize(documents)?;
        if documents.is_empty() {
            return Ok(());
        }

        info!(
            "Adding {} documents, previous number of documents: {}",
            documents.len(),
            self.corpus.len()
        );

        // The dense add may fail on the network; run it before anything else
        // grows. The lexical add cannot fail once the vectors are in, so all
        // three sequences stay the same length.
        if let Some(dense) = &mut self.dense {
            dense.vector.add(&documents).await?;
        }
        self.lexical.add(&documents).await?;
        self.corpus.append(documents);

        if let Some(cache) = &self.cache {
            cache.write().await.clear();
            debug!("Cache cleared after adding documents");
        }

        info!("New number of documents: {}", self.corpus.len());
        Ok(())
    }

    /// Search with the configured `rows`, `top_k` and `rank_fusion_k`
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        self.search_with(query, SearchParams::from(&self.config))
            .await
    }

    /// Search with explicit parameters.
    ///
    /// Without hybrid mode `top_k` is ignored and the first `rows` BM25
    /// matches are returned with their scores. In hybrid mode both
    /// retrievers return `top_k` candidates, RRF merges them, and the first
    /// `rows` fused documents are reranked. The returned scores are then the
    /// fusion scores of those `rows` candidates, while the documents follow
    /// the reranker's order.
    pub async fn search_with(&self, query: &str, params: SearchParams) -> Result<SearchResults> {
        let start = Instant::now();
        self.validate_query(query, &params)?;

        let key = CacheKey {
            query: query.to_string(),
            params,
        };
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.write().await.get(&key) {
                info!("Cache hit for query: '{query}'");
                let mut result = cached.clone();
                result.stats.cache_hit = true;
                result.stats.total_time_ms = millis(start.elapsed());
                return Ok(result);
            }
        }

        debug!("Search for '{query}' with {params:?}");

        let mut results = match &self.dense {
            None => self.lexical_search(query, params.rows).await?,
            Some(dense) => self.hybrid_search(dense, query, params).await?,
        };
        results.stats.total_time_ms = millis(start.elapsed());

        if let Some(cache) = &self.cache {
            if results.is_degraded() {
                debug!("Not caching degraded results");
            } else {
                cache.write().await.put(key, results.clone());
            }
        }

        info!(
            "Search completed in {}ms, returned {} results ({:?})",
            results.stats.total_time_ms,
            results.len(),
            results.rerank_status
        );
        Ok(results)
    }

    fn validate_query(&self, query: &str, params: &SearchParams) -> Result<()> {
        let length = query.trim().chars().count();
        if length < self.config.min_query_length || length == 0 {
            return Err(SearchError::QueryTooShort {
                min: self.config.min_query_length.max(1),
                actual: length,
            });
        }
        if params.rows == 0 {
            return Err(SearchError::InvalidConfig("rows must be > 0".to_string()));
        }
        Ok(())
    }

    async fn lexical_search(&self, query: &str, rows: usize) -> Result<SearchResults> {
        let mut stats = SearchStats::default();

        let lexical_start = Instant::now();
        let hits = self.lexical.retrieve(query, rows).await?;
        stats.lexical_time_ms = millis(lexical_start.elapsed());
        stats.lexical_count = hits.len();

        let (documents, scores): (Vec<Document>, Vec<f64>) = hits
            .iter()
            .filter_map(|hit| {
                self.corpus
                    .get(&hit.id)
                    .map(|doc| (doc.clone(), f64::from(hit.score.unwrap_or_default())))
            })
            .take(rows)
            .unzip();

        Ok(SearchResults::new(query.to_string())
            .with_documents(documents, scores)
            .with_rerank_status(RerankStatus::NotApplied)
            .with_stats(stats))
    }

    async fn hybrid_search(
        &self,
        dense: &DenseStage,
        query: &str,
        params: SearchParams,
    ) -> Result<SearchResults> {
        let mut stats = SearchStats::default();

        // Stage 1: BM25
        let lexical_start = Instant::now();
        let lexical_hits = self.lexical.retrieve(query, params.top_k).await?;
        stats.lexical_time_ms = millis(lexical_start.elapsed());
        stats.lexical_count = lexical_hits.len();

        // Stage 2: dense
        let vector_start = Instant::now();
        let vector_hits = dense.vector.retrieve(query, params.top_k).await?;
        stats.vector_time_ms = millis(vector_start.elapsed());
        stats.vector_count = vector_hits.len();

        // Stage 3: fusion
        let fusion_start = Instant::now();
        let fused = reciprocal_rank_fusion(
            &[ids(&lexical_hits), ids(&vector_hits)],
            params.rank_fusion_k,
        );
        stats.fusion_time_ms = millis(fusion_start.elapsed());
        stats.fused_count = fused.len();

        let candidates: Vec<(&Document, f64)> = fused
            .iter()
            .filter_map(|result| self.corpus.get(&result.id).map(|doc| (doc, result.score)))
            .take(params.rows)
            .collect();
        let scores: Vec<f64> = candidates.iter().map(|(_, score)| *score).collect();
        let candidate_docs: Vec<&Document> = candidates.iter().map(|(doc, _)| *doc).collect();

        // Stage 4: rerank only the rows that will be returned
        let rerank_start = Instant::now();
        let outcome = dense.reranker.rerank(query, &candidate_docs).await?;
        stats.rerank_time_ms = millis(rerank_start.elapsed());

        let status = outcome.status();
        if status == RerankStatus::Degraded {
            warn!("Reranking unavailable, returning fusion order for '{query}'");
        }
        let documents: Vec<Document> = self
            .corpus
            .resolve(outcome.scored().iter().map(|scored| &scored.id))
            .into_iter()
            .cloned()
            .collect();

        debug!(
            "Hybrid search: {} lexical + {} dense -> {} fused -> {} returned",
            stats.lexical_count,
            stats.vector_count,
            stats.fused_count,
            documents.len()
        );

        Ok(SearchResults::new(query.to_string())
            .with_documents(documents, scores)
            .with_rerank_status(status)
            .with_stats(stats))
    }

    /// Every document, in insertion order
    pub fn documents(&self) -> &[Document] {
        self.corpus.documents()
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn is_hybrid(&self) -> bool {
        self.dense.is_some()
    }

    /// Language of the current lexical index
    pub fn language(&self) -> &str {
        self.lexical.language()
    }

    pub fn lexical(&self) -> &LexicalRetriever {
        &self.lexical
    }

    pub fn vector(&self) -> Option<&VectorRetriever> {
        self.dense.as_ref().map(|dense| &dense.vector)
    }

    /// Clear search cache
    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().await.clear();
            info!("Search cache cleared");
        }
    }

    /// Get cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        match &self.cache {
            Some(cache) => {
                let cache = cache.read().await;
                CacheStats {
                    size: cache.len(),
                    capacity: cache.cap().get(),
                }
            }
            None => CacheStats {
                size: 0,
                capacity: 0,
            },
        }
    }

    /// Get configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

fn build_reranker(config: &SearchConfig) -> Result<Arc<dyn Reranker>> {
    let reranker: Arc<dyn Reranker> = match config.reranker {
        RerankerKind::Local => Arc::new(LocalReranker::new(config.show_download_progress)?),
        RerankerKind::Remote => {
            let client = CohereClient::new(
                config.cohere.endpoint.clone(),
                config.cohere.model.clone(),
                Duration::from_secs(config.cohere.timeout_secs),
            )
            .map_err(|e| SearchError::Reranking(e.to_string()))?;
            Arc::new(RemoteReranker::new(
                client,
                config.cohere.api_key.clone(),
                config.cohere.secondary_api_key.clone(),
                config.retry,
            ))
        }
    };
    Ok(reranker)
}

fn millis(elapsed: Duration) -> u64 {
    elapsed.as_millis() as u64
}

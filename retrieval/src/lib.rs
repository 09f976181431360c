/*!
# Hybrid Search

Hybrid document retrieval combining:
- **Lexical search** via BM25 with language-aware stemming and stopwords
- **Dense search** via sentence embeddings and a flat squared-L2 index
- **Reciprocal Rank Fusion (RRF)** to merge the two rankings
- **Reranking** of the top rows with a cross-encoder or the Cohere API

## Pipeline

```text
Query
  ├─> BM25 (always)
  │     └─> top_k ids + scores
  └─> Dense retrieval (hybrid mode only)
        └─> top_k ids
              └─> RRF(k) over both lists
                    └─> first `rows` fused documents
                          └─> Reranker
                                └─> final order
```

Without hybrid mode the first `rows` BM25 matches are returned directly.

## Index maintenance

Documents are only ever appended. The BM25 index is rebuilt from the full
corpus on every [`HybridSearch::add_documents`], since term weights and the
stemming language are corpus-wide. The dense index embeds only the new
documents and appends their vectors. Both retrievers keep the ids of the
documents they indexed, so results always resolve to the right document.

## Example

```rust,no_run
use hybrid_search::{Document, HybridSearch, SearchConfig, SearchParams};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let documents = vec![
        Document::with_id("01", "L'intelligenza artificiale simula l'intelligenza umana.")?,
        Document::with_id("06", "L'apprendimento per rinforzo premia le azioni corrette.")?,
    ];

    let mut search = HybridSearch::new(SearchConfig::from_env()?, documents).await?;
    search
        .add_documents(vec!["Life is what happens when you're busy making other plans."])
        .await?;

    let results = search
        .search_with("apprendimento per rinforzo", SearchParams::new(5, 50, 60))
        .await?;
    for (i, doc) in results.documents.iter().enumerate() {
        println!("{}. {} {}", i + 1, doc.id(), doc.content());
    }
    Ok(())
}
```

## Remote reranking failures

The Cohere reranker retries with a fixed delay and an optional secondary
API key. When every attempt fails the search still succeeds: the documents
come back in fusion order and [`SearchResults::rerank_status`] is
[`RerankStatus::Degraded`].
*/

mod config;
mod corpus;
mod document;
mod error;
mod fusion;
mod language;
mod lexical;
mod rerank;
mod result;
mod retriever;
mod search;
mod vector;

pub use config::{CohereConfig, RerankerKind, RetryPolicy, SearchConfig};
pub use corpus::Corpus;
pub use document::{CONTENT_ID_PREFIX, Document, DocumentId, DocumentInput};
pub use error::{RerankError, Result, SearchError};
pub use fusion::{DEFAULT_RRF_K, FusedResult, reciprocal_rank_fusion};
pub use language::{FixedLanguage, LEXICAL_LANGUAGES, LanguageDetector, LinguaDetector};
pub use lexical::LexicalRetriever;
pub use rerank::{
    CohereClient, DEFAULT_COHERE_ENDPOINT, LocalReranker, RelevanceScore, RemoteReranker,
    RerankClient, RerankOutcome, Reranker, ScoredDocument,
};
pub use result::{CacheStats, RerankStatus, SearchResults, SearchStats};
pub use retriever::{Hit, Retriever};
pub use search::{Backends, HybridSearch, SearchParams};
pub use vector::VectorRetriever;

pub use hybrid_search_embeddings as embeddings;

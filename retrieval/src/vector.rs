use crate::document::{Document, DocumentId};
use crate::error::Result;
use crate::retriever::{Hit, Retriever};
use async_trait::async_trait;
use hybrid_search_embeddings::Embedder;
use hybrid_search_vector_store::FlatIndex;
use log::{debug, info};
use std::sync::Arc;

/// Dense retriever over a flat squared-L2 index.
///
/// Adding documents embeds only the new ones and appends their vectors.
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
    index: FlatIndex,
    ids: Vec<DocumentId>,
}

impl VectorRetriever {
    pub async fn new(documents: &[Document], embedder: Arc<dyn Embedder>) -> Result<Self> {
        let mut retriever = Self {
            index: FlatIndex::new(embedder.dimension())?,
            embedder,
            ids: Vec::new(),
        };
        retriever.append(documents).await?;

        info!(
            "Vector retriever ready: {} documents, backend '{}', {} dimensions",
            retriever.ids.len(),
            retriever.embedder.name(),
            retriever.index.dimension()
        );
        Ok(retriever)
    }

    async fn append(&mut self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = documents.iter().map(Document::searchable_text).collect();
        let vectors = self.embedder.embed(&texts).await?;

        // Index first: a rejected batch must leave ids untouched
        self.index.add(&vectors)?;
        self.ids.extend(documents.iter().map(|d| d.id().clone()));
        debug!("Appended {} vectors, index size {}", vectors.len(), self.index.len());
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Hit>> {
        if self.index.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let query_vector = self.embedder.embed_single(query).await?;
        let neighbors = self.index.search(&query_vector, top_k)?;

        Ok(neighbors
            .into_iter()
            .filter_map(|neighbor| self.ids.get(neighbor.position))
            .map(|id| Hit {
                id: id.clone(),
                score: None,
            })
            .collect())
    }

    async fn add(&mut self, documents: &[Document]) -> Result<()> {
        self.append(documents).await
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn name(&self) -> &str {
        "vector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_search_embeddings::EmbeddingError;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps a text to a one-hot vector on the first known keyword
    struct KeywordEmbedder {
        keywords: Vec<&'static str>,
        embedded: AtomicUsize,
    }

    impl KeywordEmbedder {
        fn new(keywords: &[&'static str]) -> Self {
            Self {
                keywords: keywords.to_vec(),
                embedded: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|text| {
                    self.keywords
                        .iter()
                        .map(|k| if text.contains(k) { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            self.keywords.len()
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    fn docs(items: &[(&str, &str)]) -> Vec<Document> {
        items
            .iter()
            .map(|(id, content)| Document::with_id(*id, *content).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_nearest_first() {
        let embedder = Arc::new(KeywordEmbedder::new(&["cat", "dog", "fish"]));
        let corpus = docs(&[("a", "a dog"), ("b", "a cat"), ("c", "a fish")]);
        let retriever = VectorRetriever::new(&corpus, embedder).await.unwrap();

        let hits = retriever.retrieve("cat", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id.as_str(), "b");
        assert_eq!(hits[0].score, None);
    }

    #[tokio::test]
    async fn test_add_embeds_only_new_documents() {
        let embedder = Arc::new(KeywordEmbedder::new(&["cat", "dog", "fish"]));
        let corpus = docs(&[("a", "a dog"), ("b", "a cat"), ("c", "a fish")]);
        let mut retriever = VectorRetriever::new(&corpus, embedder.clone()).await.unwrap();
        assert_eq!(embedder.embedded.load(Ordering::SeqCst), 3);

        retriever
            .add(&docs(&[("d", "dog and cat"), ("e", "fish only")]))
            .await
            .unwrap();

        assert_eq!(embedder.embedded.load(Ordering::SeqCst), 5);
        assert_eq!(retriever.len(), 5);

        let hits = retriever.retrieve("dog cat", 1).await.unwrap();
        assert_eq!(hits[0].id.as_str(), "d");
    }

    #[tokio::test]
    async fn test_empty_index() {
        let embedder = Arc::new(KeywordEmbedder::new(&["cat"]));
        let retriever = VectorRetriever::new(&[], embedder.clone()).await.unwrap();

        assert!(retriever.retrieve("cat", 5).await.unwrap().is_empty());
        assert_eq!(embedder.embedded.load(Ordering::SeqCst), 0);
        assert_eq!(retriever.dimension(), 1);
    }
}

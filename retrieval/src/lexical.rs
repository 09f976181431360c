use crate::document::{Document, DocumentId};
use crate::error::Result;
use crate::language::{LanguageDetector, normalize_code, to_bm25};
use crate::retriever::{Hit, Retriever};
use async_trait::async_trait;
use bm25::{Embedder, EmbedderBuilder, Scorer};
use log::{debug, info, warn};
use std::sync::Arc;

/// BM25 retriever whose index is rebuilt from the full corpus on every add.
///
/// Term weights depend on corpus-wide statistics and on the stemmer, so a
/// fresh index keeps both consistent with the current language.
pub struct LexicalRetriever {
    detector: Arc<dyn LanguageDetector>,
    pinned_language: Option<String>,
    language: String,
    ids: Vec<DocumentId>,
    texts: Vec<String>,
    index: Option<Scorer<usize>>,
    rebuild_count: usize,
}

impl LexicalRetriever {
    /// Build the retriever over `documents`.
    ///
    /// Without a pinned language the corpus language is detected from the
    /// concatenated searchable text, falling back to `fallback_language`.
    pub fn new(
        documents: &[Document],
        language: Option<&str>,
        detector: Arc<dyn LanguageDetector>,
        fallback_language: &str,
    ) -> Result<Self> {
        let pinned_language = language.map(normalize_code).transpose()?;
        let fallback = normalize_code(fallback_language)?;
        let texts: Vec<String> = documents.iter().map(Document::searchable_text).collect();

        let language = match &pinned_language {
            Some(code) => code.clone(),
            None => detect_or(&*detector, &texts, &fallback),
        };

        let mut retriever = Self {
            detector,
            pinned_language,
            language,
            ids: documents.iter().map(|d| d.id().clone()).collect(),
            texts,
            index: None,
            rebuild_count: 0,
        };
        retriever.index()?;

        info!(
            "Lexical retriever ready: {} documents, language '{}'",
            retriever.ids.len(),
            retriever.language
        );
        Ok(retriever)
    }

    /// Tokenize the whole corpus and build a fresh index
    fn index(&mut self) -> Result<()> {
        self.rebuild_count += 1;
        if self.texts.is_empty() {
            self.index = None;
            return Ok(());
        }

        let corpus: Vec<&str> = self.texts.iter().map(String::as_str).collect();
        let embedder: Embedder =
            EmbedderBuilder::with_fit_to_corpus(to_bm25(&self.language)?, &corpus).build();

        let mut scorer = Scorer::<usize>::new();
        for (position, text) in self.texts.iter().enumerate() {
            scorer.upsert(&position, embedder.embed(text));
        }
        self.index = Some(scorer);

        debug!(
            "Rebuilt lexical index #{} over {} documents ({})",
            self.rebuild_count,
            self.texts.len(),
            self.language
        );
        Ok(())
    }

    fn query_language(&self, query: &str) -> String {
        if let Some(code) = &self.pinned_language {
            return code.clone();
        }
        self.detector
            .detect(query)
            .and_then(|code| normalize_code(&code).ok())
            .unwrap_or_else(|| self.language.clone())
    }

    /// Language the current index was built with
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Number of documents covered by the current index
    pub fn indexed_len(&self) -> usize {
        self.index.as_ref().map_or(0, |_| self.texts.len())
    }

    /// How many times the index has been built, construction included
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }
}

#[async_trait]
impl Retriever for LexicalRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Hit>> {
        let Some(index) = &self.index else {
            return Ok(Vec::new());
        };

        let query_language = self.query_language(query);
        let query_embedder: Embedder =
            EmbedderBuilder::with_fit_to_corpus(to_bm25(&query_language)?, &[query]).build();
        let query_embedding = query_embedder.embed(query);

        let mut scored: Vec<(usize, f32)> = index
            .matches(&query_embedding)
            .into_iter()
            .filter(|matched| matched.score > 0.0)
            .map(|matched| (matched.id, matched.score))
            .collect();
        // Equal scores keep corpus order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        debug!(
            "Lexical retrieval ({query_language}) matched {} of {} documents",
            scored.len(),
            self.texts.len()
        );

        Ok(scored
            .into_iter()
            .map(|(position, score)| Hit {
                id: self.ids[position].clone(),
                score: Some(score),
            })
            .collect())
    }

    async fn add(&mut self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let new_texts: Vec<String> = documents.iter().map(Document::searchable_text).collect();
        if self.pinned_language.is_none() {
            let previous = self.language.clone();
            self.language = detect_or(&*self.detector, &new_texts, &previous);
            if self.language != previous {
                info!(
                    "Lexical language changed from '{previous}' to '{}'",
                    self.language
                );
            }
        }

        self.ids.extend(documents.iter().map(|d| d.id().clone()));
        self.texts.extend(new_texts);
        self.index()
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn name(&self) -> &str {
        "lexical"
    }
}

/// Detected language of `texts`, or `fallback` when detection fails or the
/// detected language has no lexical support
fn detect_or(detector: &dyn LanguageDetector, texts: &[String], fallback: &str) -> String {
    if texts.is_empty() {
        return fallback.to_string();
    }
    match detector.detect(&texts.join("\n")) {
        Some(code) => normalize_code(&code).unwrap_or_else(|_| {
            warn!("Detected language '{code}' has no lexical support, keeping '{fallback}'");
            fallback.to_string()
        }),
        None => fallback.to_string(),
    }
}

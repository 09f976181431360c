use crate::document::{Document, DocumentId};
use log::debug;
use std::collections::HashMap;

/// The authoritative, append-only document sequence.
///
/// Duplicate ids are accepted. Lookups by id resolve to the first document
/// in insertion order carrying that id.
#[derive(Debug, Default, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
    first_position: HashMap<DocumentId, usize>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        let mut corpus = Self::default();
        corpus.append(documents);
        corpus
    }

    /// Extend the sequence, preserving insertion order
    pub fn append(&mut self, documents: Vec<Document>) {
        let start = self.documents.len();
        for (offset, document) in documents.iter().enumerate() {
            if self.first_position.contains_key(document.id()) {
                debug!("Duplicate document id {} at position {}", document.id(), start + offset);
                continue;
            }
            self.first_position
                .insert(document.id().clone(), start + offset);
        }
        self.documents.extend(documents);
    }

    /// Resolve ids to documents, first match wins; unknown ids are skipped
    pub fn resolve<'a, I>(&self, ids: I) -> Vec<&Document>
    where
        I: IntoIterator<Item = &'a DocumentId>,
    {
        ids.into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.first_position
            .get(id)
            .and_then(|&position| self.documents.get(position))
    }

    pub fn at(&self, position: usize) -> Option<&Document> {
        self.documents.get(position)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

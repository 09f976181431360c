use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Prefix of ids derived from content. Bump it if the hashing scheme changes.
pub const CONTENT_ID_PREFIX: &str = "sha256:";

/// Identity of a document.
///
/// Either assigned by the caller or derived from the content with
/// [`DocumentId::from_content`]. Ordering and hashing use the raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Content-addressed id: SHA-256 of the UTF-8 content, hex encoded.
    ///
    /// Stable across processes, platforms and releases.
    pub fn from_content(content: &str) -> Self {
        let digest = Sha256::digest(content.as_bytes());
        let mut id = String::with_capacity(CONTENT_ID_PREFIX.len() + digest.len() * 2);
        id.push_str(CONTENT_ID_PREFIX);
        for byte in digest {
            id.push_str(&format!("{byte:02x}"));
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A searchable document.
///
/// Two documents are equal when their ids are equal, whatever their content.
/// Deserialization applies the same content check as the constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DocumentRepr")]
pub struct Document {
    id: DocumentId,

    title: String,

    content: String,

    metadata: HashMap<String, serde_json::Value>,
}

/// Wire form of [`Document`], validated on the way in
#[derive(Deserialize)]
struct DocumentRepr {
    id: DocumentId,

    #[serde(default)]
    title: String,

    content: String,

    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

impl TryFrom<DocumentRepr> for Document {
    type Error = SearchError;

    fn try_from(repr: DocumentRepr) -> Result<Self> {
        Document::check_content(&repr.content)?;
        Ok(Self {
            id: repr.id,
            title: repr.title,
            content: repr.content,
            metadata: repr.metadata,
        })
    }
}

impl Document {
    /// Document with a content-derived id, no title and no metadata
    pub fn new(content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        Self::check_content(&content)?;
        Ok(Self {
            id: DocumentId::from_content(&content),
            title: String::new(),
            content,
            metadata: HashMap::new(),
        })
    }

    /// Document with a caller-assigned id
    pub fn with_id(id: impl Into<DocumentId>, content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        Self::check_content(&content)?;
        Ok(Self {
            id: id.into(),
            title: String::new(),
            content,
            metadata: HashMap::new(),
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    fn check_content(content: &str) -> Result<()> {
        if content.is_empty() {
            return Err(SearchError::InvalidDocument(
                "document content cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Title and content joined by a newline, trimmed
    pub fn searchable_text(&self) -> String {
        format!("{}\n{}", self.title, self.content).trim().to_string()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Anything that can be added to a corpus: raw text or a full document
#[derive(Debug, Clone)]
pub enum DocumentInput {
    Text(String),
    Document(Document),
}

impl DocumentInput {
    pub fn into_document(self) -> Result<Document> {
        match self {
            DocumentInput::Text(text) => Document::new(text),
            DocumentInput::Document(document) => Ok(document),
        }
    }
}

impl From<&str> for DocumentInput {
    fn from(text: &str) -> Self {
        DocumentInput::Text(text.to_string())
    }
}

impl From<String> for DocumentInput {
    fn from(text: String) -> Self {
        DocumentInput::Text(text)
    }
}

impl From<Document> for DocumentInput {
    fn from(document: Document) -> Self {
        DocumentInput::Document(document)
    }
}

/// Convert a batch of inputs, failing on the first invalid one
pub(crate) fn normalize<I, D>(inputs: I) -> Result<Vec<Document>>
where
    I: IntoIterator<Item = D>,
    D: Into<DocumentInput>,
{
    inputs
        .into_iter()
        .map(|input| input.into().into_document())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_content_rejected() {
        assert!(matches!(
            Document::new(""),
            Err(SearchError::InvalidDocument(_))
        ));
        assert!(Document::with_id("01", "").is_err());
    }

    #[test]
    fn test_content_id_is_deterministic() {
        let a = Document::new("Il gatto dorme.").unwrap();
        let b = Document::new("Il gatto dorme.").unwrap();
        let c = Document::new("Il cane abbaia.").unwrap();

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(
            DocumentId::from_content("abc").as_str(),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_searchable_text() {
        let untitled = Document::with_id("1", "  body text ").unwrap();
        assert_eq!(untitled.searchable_text(), "body text");

        let titled = Document::with_id("2", "body").unwrap().with_title("Heading");
        assert_eq!(titled.searchable_text(), "Heading\nbody");
    }

    #[test]
    fn test_equality_by_id_only() {
        let a = Document::with_id("07", "first version").unwrap();
        let b = Document::with_id("07", "second version").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_metadata_builder() {
        let doc = Document::with_id("01", "content")
            .unwrap()
            .with_metadata("author", json!("John Doe"));
        assert_eq!(doc.metadata().get("author"), Some(&json!("John Doe")));
    }

    #[test]
    fn test_deserialize_checks_content() {
        let doc: Document = serde_json::from_str(
            r#"{"id":"01","content":"testo","metadata":{"author":"John Doe"}}"#,
        )
        .unwrap();
        assert_eq!(doc.id().as_str(), "01");
        assert_eq!(doc.title(), "");
        assert_eq!(doc.metadata().get("author"), Some(&json!("John Doe")));

        let empty = serde_json::from_str::<Document>(r#"{"id":"x","content":""}"#);
        assert!(empty.is_err());
    }

    #[test]
    fn test_serialize_round_trip_keeps_fields() {
        let doc = Document::with_id("02", "contenuto")
            .unwrap()
            .with_title("Titolo");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["title"], json!("Titolo"));

        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back.title(), "Titolo");
        assert_eq!(back.content(), "contenuto");
    }

    #[test]
    fn test_normalize_mixed_inputs() {
        let docs = normalize(vec![
            DocumentInput::from("plain text"),
            DocumentInput::from(Document::with_id("x", "explicit").unwrap()),
        ])
        .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id(), &DocumentId::from_content("plain text"));
        assert_eq!(docs[1].id().as_str(), "x");
        assert!(normalize(vec!["ok", ""]).is_err());
    }
}

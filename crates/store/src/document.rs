//! Document value type stored in and returned from the vector store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A piece of content with its embedding and provenance.
///
/// `score` is never persisted; it is filled in on search results only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Caller-assigned identifier
    pub id: String,

    /// Text content
    pub content: String,

    /// Embedding vector; empty means "not embedded"
    #[serde(default)]
    pub embedding: Vec<f32>,

    /// Provenance class, e.g. "file" or "url"
    #[serde(default)]
    pub source_type: String,

    /// Provenance instance, e.g. a file name
    #[serde(default)]
    pub source_name: String,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Relevance score, populated on search results
    #[serde(skip)]
    pub score: Option<f32>,
}

impl Document {
    /// Create a document with content and an id, no embedding, and an empty source.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding: Vec::new(),
            source_type: String::new(),
            source_name: String::new(),
            metadata: Map::new(),
            score: None,
        }
    }

    pub fn with_source(mut self, source_type: impl Into<String>, source_name: impl Into<String>) -> Self {
        self.source_type = source_type.into();
        self.source_name = source_name.into();
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Insert or overwrite a metadata entry.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }

    /// The deletion/reindex scope this document belongs to.
    pub fn source(&self) -> SourceKey {
        SourceKey::new(&self.source_type, &self.source_name)
    }

    pub fn belongs_to(&self, source: &SourceKey) -> bool {
        self.source_type == source.source_type && self.source_name == source.source_name
    }
}

/// The `(source_type, source_name)` pair used as the unit of deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceKey {
    pub source_type: String,
    pub source_name: String,
}

impl SourceKey {
    pub fn new(source_type: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            source_name: source_name.into(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_type, self.source_name)
    }
}

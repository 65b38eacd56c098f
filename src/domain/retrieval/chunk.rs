//! Candidate passage returned by a retriever

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A candidate passage
///
/// The embedding belongs to the retrieval backend; scoring only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier of the chunk
    pub id: String,
    /// Passage text
    pub content: String,
    /// Identifier of the source document
    pub document_id: String,
    /// Page number within the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Section heading within the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Backend metadata (study type, topics, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Score assigned by the retrieval backend
    #[serde(default)]
    pub retrieval_score: f32,
    /// Embedding vector, if the backend supplied one
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        id: impl Into<String>,
        document_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            document_id: document_id.into(),
            page: None,
            section: None,
            metadata: HashMap::new(),
            retrieval_score: 0.0,
            embedding: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_retrieval_score(mut self, score: f32) -> Self {
        self.retrieval_score = score;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Borrow the embedding vector, if any
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Leading slice of the content, cut on a char boundary
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }
}

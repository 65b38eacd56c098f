//! `/v1/answer` request and response bodies

use serde::{Deserialize, Serialize};

use crate::domain::{Chunk, DecisionStatus, PolicyConfig, QueryHints, Trace};

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub study_type: Option<String>,
    /// Per-request policy; the configured policy when absent
    #[serde(default)]
    pub policy: Option<PolicyConfig>,
}

impl AnswerRequest {
    pub fn hints(&self) -> QueryHints {
        QueryHints::new(self.topic.as_deref(), self.study_type.as_deref())
    }
}

/// Context passage as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk<'a> {
    pub id: &'a str,
    pub document_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub content: &'a str,
}

impl<'a> From<&'a Chunk> for ContextChunk<'a> {
    fn from(chunk: &'a Chunk) -> Self {
        Self {
            id: &chunk.id,
            document_id: &chunk.document_id,
            section: chunk.section.as_deref(),
            page: chunk.page,
            content: &chunk.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse<'a> {
    pub answer: Option<&'a str>,
    pub status: DecisionStatus,
    pub final_context: Vec<ContextChunk<'a>>,
    pub trace: &'a Trace,
}

//! Result of one retrieval pass

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::retrieval::Chunk;

/// How a pass retrieved its candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Plain vector search on the question
    Semantic,
    /// Vector search with metadata filters and an augmented query
    Filtered,
    /// Vector search on a reformulated question
    Reformulated,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Filtered => write!(f, "filtered"),
            Self::Reformulated => write!(f, "reformulated"),
        }
    }
}

/// A chunk with the similarity it scored against the original question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Similarity in [0, 1]
    pub similarity: f32,
    /// Position in the retriever's native ranking
    pub retrieval_rank: usize,
    /// True when no usable vector was available and the neutral score was used
    pub neutral: bool,
}

/// Outcome of one pass, read-only once built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassResult {
    /// 1-based pass index
    pub pass_index: u32,
    pub strategy: Strategy,
    /// Query text sent to the retriever
    pub query_used: String,
    /// Re-ranked chunks, best first
    pub chunks: Vec<ScoredChunk>,
    /// Combined score in [0, 1]
    pub score: f32,
    /// Aggregated similarity score in [0, 1]
    pub semantic_score: f32,
    /// Judge score, when the judge was consulted and answered
    pub judge_score: Option<f32>,
    pub judge_rationale: String,
    /// Human readable filters applied to the retrieval
    pub filters: Vec<String>,
    /// Fallbacks that happened while producing this pass
    pub degradations: Vec<String>,
}

impl PassResult {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    /// Iterate the underlying chunks, best first
    pub fn iter_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().map(|scored| &scored.chunk)
    }

    /// Concatenated chunk text, capped at `max_chars`
    pub fn context_text(&self, max_chars: usize) -> String {
        let joined = self
            .iter_chunks()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        match joined.char_indices().nth(max_chars) {
            Some((idx, _)) => joined[..idx].to_string(),
            None => joined,
        }
    }
}

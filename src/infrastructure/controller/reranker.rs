//! Over-fetching re-ranker
//!
//! Retrieves more candidates than requested, scores each one against the
//! original question and keeps the best `k`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::controller::{ScoredChunk, SimilarityScorer};
use crate::domain::embedding::is_usable_vector;
use crate::domain::retrieval::{Chunk, MetadataFilter, Retriever, SearchParams};
use crate::domain::{DomainError, Embedder};
use crate::infrastructure::retry::RetryPolicy;

/// Chunk chars sent to the embedder when a chunk has no vector
const EMBED_CHARS: usize = 1000;

/// Retrieval sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks kept per pass
    #[serde(default = "default_k")]
    pub k: usize,
    /// Over-fetch factor applied to `k`
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
    /// Upper bound on candidates requested from the retriever
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

fn default_k() -> usize {
    6
}

fn default_candidate_multiplier() -> usize {
    2
}

fn default_max_candidates() -> usize {
    12
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            candidate_multiplier: default_candidate_multiplier(),
            max_candidates: default_max_candidates(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.k == 0 {
            return Err(DomainError::configuration("retrieval.k must be at least 1"));
        }
        if self.candidate_multiplier == 0 {
            return Err(DomainError::configuration(
                "retrieval.candidate_multiplier must be at least 1",
            ));
        }
        Ok(())
    }

    /// k × multiplier, capped at `max_candidates`, never below k
    pub fn candidate_count(&self) -> usize {
        self.k
            .saturating_mul(self.candidate_multiplier)
            .min(self.max_candidates)
            .max(self.k)
    }
}

/// Re-ranked candidates of one pass
#[derive(Debug, Clone, Default)]
pub struct RankedCandidates {
    /// Best first, at most `k`
    pub chunks: Vec<ScoredChunk>,
    /// Aggregated similarity of `chunks`
    pub semantic_score: f32,
    pub degradations: Vec<String>,
}

#[derive(Debug)]
pub struct Reranker {
    retriever: Arc<dyn Retriever>,
    embedder: Arc<dyn Embedder>,
    scorer: SimilarityScorer,
    config: RetrievalConfig,
    retry: RetryPolicy,
}

impl Reranker {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        embedder: Arc<dyn Embedder>,
        scorer: SimilarityScorer,
        config: RetrievalConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            retriever,
            embedder,
            scorer,
            config,
            retry,
        }
    }

    /// Retrieve with `retrieval_query`, then rank against `question`
    ///
    /// Never fails: retrieval and embedding failures are reported as
    /// degradations with the corresponding fallback applied.
    pub async fn rank(
        &self,
        retrieval_query: &str,
        question: &str,
        filter: Option<MetadataFilter>,
    ) -> RankedCandidates {
        let mut degradations = Vec::new();
        let params = SearchParams::new(retrieval_query, self.config.candidate_count())
            .with_filter(filter);

        let candidates = match self
            .retry
            .execute("retrieval", || self.retriever.search(params.clone()))
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(retriever = self.retriever.retriever_name(), error = %e, "Retrieval failed");
                degradations.push(format!("retrieval failed: {}", e));
                Vec::new()
            }
        };

        debug!(
            requested = params.top_k,
            received = candidates.len(),
            "Retrieved candidates"
        );

        if candidates.is_empty() {
            return RankedCandidates {
                chunks: Vec::new(),
                semantic_score: 0.0,
                degradations,
            };
        }

        let question_vector = match self
            .retry
            .with_timeout("embed question", self.embedder.embed(question))
            .await
        {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(error = %e, "Question embedding failed, using neutral similarity");
                degradations.push(format!("question embedding failed: {}", e));
                None
            }
        };

        let fallback_vectors = match &question_vector {
            Some(reference) => {
                self.embed_missing(reference, &candidates, &mut degradations)
                    .await
            }
            None => vec![None; candidates.len()],
        };

        let mut scored: Vec<ScoredChunk> = candidates
            .into_iter()
            .zip(fallback_vectors)
            .enumerate()
            .map(|(rank, (chunk, fallback))| {
                let vector = fallback.as_deref().or(chunk.embedding());
                let similarity = self.scorer.similarity(question_vector.as_deref(), vector);
                ScoredChunk {
                    similarity: similarity.similarity,
                    neutral: similarity.neutral,
                    retrieval_rank: rank,
                    chunk,
                }
            })
            .collect();

        let neutral = scored.iter().filter(|s| s.neutral).count();
        if neutral > 0 {
            warn!(neutral, "Chunks scored with neutral similarity");
            degradations.push(format!(
                "{} chunk(s) scored neutral: no usable embedding",
                neutral
            ));
        }

        // Stable: ties keep retrieval order
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(self.config.k);

        let similarities: Vec<f32> = scored.iter().map(|s| s.similarity).collect();
        RankedCandidates {
            semantic_score: self.scorer.aggregate(&similarities),
            chunks: scored,
            degradations,
        }
    }

    /// Embed, in one batch, the chunks whose backend vector is unusable
    async fn embed_missing(
        &self,
        reference: &[f32],
        chunks: &[Chunk],
        degradations: &mut Vec<String>,
    ) -> Vec<Option<Vec<f32>>> {
        let mut vectors = vec![None; chunks.len()];
        let missing: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| {
                chunk
                    .embedding()
                    .is_none_or(|vector| !is_usable_vector(reference, vector))
            })
            .map(|(i, _)| i)
            .collect();

        if missing.is_empty() {
            return vectors;
        }

        let texts: Vec<String> = missing
            .iter()
            .map(|&i| chunks[i].excerpt(EMBED_CHARS).to_string())
            .collect();

        match self
            .retry
            .with_timeout("embed chunks", self.embedder.embed_batch(&texts))
            .await
        {
            Ok(embedded) => {
                for (&i, vector) in missing.iter().zip(embedded) {
                    vectors[i] = Some(vector);
                }
            }
            Err(e) => {
                warn!(count = missing.len(), error = %e, "Chunk embedding failed");
                degradations.push(format!("chunk embedding failed: {}", e));
            }
        }

        vectors
    }
}

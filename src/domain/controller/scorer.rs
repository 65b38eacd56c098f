//! Similarity scoring and score combination

use serde::{Deserialize, Serialize};

use crate::domain::embedding::{cosine_similarity, is_usable_vector};
use crate::domain::DomainError;

/// Similarity assigned to a chunk without a usable vector
pub const NEUTRAL_SIMILARITY: f32 = 0.5;

/// How per-chunk similarities collapse into one pass score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Mean of the top-k similarities
    #[default]
    MeanTopK,
    /// Best similarity
    MaxTopK,
    /// 0.6 max + 0.3 mean + 0.1 coverage, coverage = min(1, n / 6)
    Blended,
}

/// Scoring settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub aggregation: Aggregation,
    /// k for the top-k aggregations
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,
    #[serde(default = "default_judge_weight")]
    pub judge_weight: f32,
    /// The judge is not consulted below this semantic score
    #[serde(default = "default_judge_skip_below")]
    pub judge_skip_below: f32,
}

fn default_top_k() -> usize {
    3
}

fn default_semantic_weight() -> f32 {
    0.6
}

fn default_judge_weight() -> f32 {
    0.4
}

fn default_judge_skip_below() -> f32 {
    0.2
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::default(),
            top_k: default_top_k(),
            semantic_weight: default_semantic_weight(),
            judge_weight: default_judge_weight(),
            judge_skip_below: default_judge_skip_below(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.top_k == 0 {
            return Err(DomainError::configuration("scoring.top_k must be at least 1"));
        }
        let weights = [self.semantic_weight, self.judge_weight];
        if weights.iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err(DomainError::configuration(
                "scoring weights must be within [0, 1]",
            ));
        }
        if (self.semantic_weight + self.judge_weight - 1.0).abs() > 1e-4 {
            return Err(DomainError::configuration(format!(
                "scoring weights must sum to 1, got {} + {}",
                self.semantic_weight, self.judge_weight
            )));
        }
        if !(0.0..=1.0).contains(&self.judge_skip_below) {
            return Err(DomainError::configuration(
                "scoring.judge_skip_below must be within [0, 1]",
            ));
        }
        Ok(())
    }

    /// Combined pass score; a missing judge score leaves the semantic score
    pub fn combine(&self, semantic: f32, judge: Option<f32>) -> f32 {
        match judge {
            Some(judge) => {
                (self.semantic_weight * semantic + self.judge_weight * judge).clamp(0.0, 1.0)
            }
            None => semantic,
        }
    }
}

/// Similarity of one chunk to the question
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkSimilarity {
    pub similarity: f32,
    /// The neutral value was used
    pub neutral: bool,
}

/// Deterministic cosine-based scorer
#[derive(Debug, Clone, Copy)]
pub struct SimilarityScorer {
    aggregation: Aggregation,
    top_k: usize,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(Aggregation::default(), default_top_k())
    }
}

impl SimilarityScorer {
    pub fn new(aggregation: Aggregation, top_k: usize) -> Self {
        Self {
            aggregation,
            top_k: top_k.max(1),
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.aggregation, config.top_k)
    }

    /// Similarity of one chunk vector, clamped to [0, 1]
    ///
    /// Missing or malformed vectors (on either side) yield the neutral value.
    pub fn similarity(&self, query: Option<&[f32]>, chunk: Option<&[f32]>) -> ChunkSimilarity {
        match (query, chunk) {
            (Some(query), Some(chunk)) if is_usable_vector(query, chunk) => ChunkSimilarity {
                similarity: cosine_similarity(query, chunk).clamp(0.0, 1.0),
                neutral: false,
            },
            _ => ChunkSimilarity {
                similarity: NEUTRAL_SIMILARITY,
                neutral: true,
            },
        }
    }

    /// Collapse similarities into one score in [0, 1]; empty input gives 0
    pub fn aggregate(&self, similarities: &[f32]) -> f32 {
        if similarities.is_empty() {
            return 0.0;
        }

        let mut sorted = similarities.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));

        let score = match self.aggregation {
            Aggregation::MeanTopK => {
                let top = &sorted[..self.top_k.min(sorted.len())];
                top.iter().sum::<f32>() / top.len() as f32
            }
            Aggregation::MaxTopK => sorted[0],
            Aggregation::Blended => {
                let max = sorted[0];
                let mean = sorted.iter().sum::<f32>() / sorted.len() as f32;
                let coverage = (sorted.len() as f32 / 6.0).min(1.0);
                0.6 * max + 0.3 * mean + 0.1 * coverage
            }
        };

        score.clamp(0.0, 1.0)
    }
}

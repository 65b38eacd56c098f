//! Controller policy - validated thresholds and retry flags

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a policy is rejected at construction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyViolation {
    #[error("min_relevance_score must be within [0, 1], got {0}")]
    MinRelevanceOutOfRange(f32),

    #[error("high_confidence_threshold must be within [0, 1], got {0}")]
    HighConfidenceOutOfRange(f32),

    #[error("min_relevance_score ({min}) must not exceed high_confidence_threshold ({high})")]
    ThresholdsInverted { min: f32, high: f32 },

    #[error("max_passes must be at least 1")]
    NoPasses,
}

/// Unvalidated policy fields, as read from configuration or a request body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_min_relevance_score")]
    pub min_relevance_score: f32,
    #[serde(default = "default_high_confidence_threshold")]
    pub high_confidence_threshold: f32,
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,
    #[serde(default = "default_true")]
    pub enable_filtered_retry: bool,
    #[serde(default = "default_true")]
    pub enable_semantic_retry: bool,
}

fn default_min_relevance_score() -> f32 {
    0.5
}

fn default_high_confidence_threshold() -> f32 {
    0.8
}

fn default_max_passes() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_relevance_score: default_min_relevance_score(),
            high_confidence_threshold: default_high_confidence_threshold(),
            max_passes: default_max_passes(),
            enable_filtered_retry: true,
            enable_semantic_retry: true,
        }
    }
}

/// Immutable controller policy
///
/// Always satisfies `0 <= min_relevance_score <= high_confidence_threshold <= 1`
/// and `max_passes >= 1`. Shared read-only across concurrent queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyConfig", into = "PolicyConfig")]
pub struct Policy {
    min_relevance_score: f32,
    high_confidence_threshold: f32,
    max_passes: u32,
    enable_filtered_retry: bool,
    enable_semantic_retry: bool,
}

impl Policy {
    /// Create a validated policy
    pub fn new(
        min_relevance_score: f32,
        high_confidence_threshold: f32,
        max_passes: u32,
        enable_filtered_retry: bool,
        enable_semantic_retry: bool,
    ) -> Result<Self, PolicyViolation> {
        if !(0.0..=1.0).contains(&min_relevance_score) {
            return Err(PolicyViolation::MinRelevanceOutOfRange(min_relevance_score));
        }
        if !(0.0..=1.0).contains(&high_confidence_threshold) {
            return Err(PolicyViolation::HighConfidenceOutOfRange(
                high_confidence_threshold,
            ));
        }
        if min_relevance_score > high_confidence_threshold {
            return Err(PolicyViolation::ThresholdsInverted {
                min: min_relevance_score,
                high: high_confidence_threshold,
            });
        }
        if max_passes == 0 {
            return Err(PolicyViolation::NoPasses);
        }

        Ok(Self {
            min_relevance_score,
            high_confidence_threshold,
            max_passes,
            enable_filtered_retry,
            enable_semantic_retry,
        })
    }

    pub fn min_relevance_score(&self) -> f32 {
        self.min_relevance_score
    }

    pub fn high_confidence_threshold(&self) -> f32 {
        self.high_confidence_threshold
    }

    pub fn max_passes(&self) -> u32 {
        self.max_passes
    }

    pub fn enable_filtered_retry(&self) -> bool {
        self.enable_filtered_retry
    }

    pub fn enable_semantic_retry(&self) -> bool {
        self.enable_semantic_retry
    }
}

impl Default for Policy {
    fn default() -> Self {
        let config = PolicyConfig::default();
        Self {
            min_relevance_score: config.min_relevance_score,
            high_confidence_threshold: config.high_confidence_threshold,
            max_passes: config.max_passes,
            enable_filtered_retry: config.enable_filtered_retry,
            enable_semantic_retry: config.enable_semantic_retry,
        }
    }
}

impl TryFrom<PolicyConfig> for Policy {
    type Error = PolicyViolation;

    fn try_from(config: PolicyConfig) -> Result<Self, Self::Error> {
        Self::new(
            config.min_relevance_score,
            config.high_confidence_threshold,
            config.max_passes,
            config.enable_filtered_retry,
            config.enable_semantic_retry,
        )
    }
}

impl From<Policy> for PolicyConfig {
    fn from(policy: Policy) -> Self {
        Self {
            min_relevance_score: policy.min_relevance_score,
            high_confidence_threshold: policy.high_confidence_threshold,
            max_passes: policy.max_passes,
            enable_filtered_retry: policy.enable_filtered_retry,
            enable_semantic_retry: policy.enable_semantic_retry,
        }
    }
}

//! Query reformulation seam and the deterministic keyword fallback

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::pass::PassResult;
use crate::domain::retrieval::Query;

/// No usable alternative query could be produced
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Reformulation failed: {reason}")]
pub struct ReformulationFailure {
    pub reason: String,
}

impl ReformulationFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Produces an alternative query for a failing one
#[async_trait]
pub trait QueryReformulator: Send + Sync + Debug {
    /// Reformulate `original` using the weakest pass so far
    ///
    /// The returned query never equals `original` nor any entry of
    /// `used_queries`.
    async fn reformulate(
        &self,
        original: &Query,
        weak_pass: &PassResult,
        used_queries: &[String],
    ) -> Result<Query, ReformulationFailure>;

    fn reformulator_name(&self) -> &'static str;
}

/// Keyword groups: trigger words and the expansion terms they add
const EXPANSIONS: &[(&[&str], &str)] = &[
    (&["heart", "cardio", "blood pressure"], "cardiovascular cardiac"),
    (&["sleep", "rest"], "sleep quality circadian"),
    (&["exercise", "fitness", "training"], "physical activity aerobic"),
    (&["vo2", "oxygen"], "cardiorespiratory fitness aerobic capacity"),
];

const GENERAL_EXPANSION: &str = "aging longevity";

/// Minimum length, in chars, of an acceptable reformulation
const MIN_REFORMULATION_CHARS: usize = 10;

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether `candidate` is a usable reformulation of `original`
pub fn is_acceptable_reformulation(candidate: &str, original: &str, used_queries: &[String]) -> bool {
    let candidate = normalize(candidate);

    candidate.chars().count() > MIN_REFORMULATION_CHARS
        && candidate != normalize(original)
        && !used_queries.iter().any(|used| normalize(used) == candidate)
}

/// Deterministic reformulation by appending domain terms
///
/// Tries each matching keyword group in order, then the general longevity
/// terms, and returns the first candidate not used yet.
pub fn keyword_expansion(original: &str, used_queries: &[String]) -> Result<String, ReformulationFailure> {
    let lower = original.to_lowercase();
    let base = original.trim();

    EXPANSIONS
        .iter()
        .filter(|(triggers, _)| triggers.iter().any(|t| lower.contains(t)))
        .map(|(_, terms)| *terms)
        .chain(std::iter::once(GENERAL_EXPANSION))
        .map(|terms| format!("{base} {terms}"))
        .find(|candidate| is_acceptable_reformulation(candidate, original, used_queries))
        .ok_or_else(|| {
            ReformulationFailure::new("every keyword expansion has already been tried")
        })
}

/// Reformulator that only appends domain keywords
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordReformulator;

#[async_trait]
impl QueryReformulator for KeywordReformulator {
    async fn reformulate(
        &self,
        original: &Query,
        _weak_pass: &PassResult,
        used_queries: &[String],
    ) -> Result<Query, ReformulationFailure> {
        keyword_expansion(original.text(), used_queries).map(|text| original.rephrased(text))
    }

    fn reformulator_name(&self) -> &'static str {
        "keyword"
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_and_identical_candidates() {
        let used = vec!["How does sleep affect aging?".to_string()];

        assert!(!is_acceptable_reformulation("", "How does sleep affect aging?", &used));
        assert!(!is_acceptable_reformulation("sleep", "How does sleep affect aging?", &used));
        assert!(!is_acceptable_reformulation(
            "  how does SLEEP affect   aging? ",
            "How does sleep affect aging?",
            &used
        ));
        assert!(is_acceptable_reformulation(
            "sleep duration and biological aging markers",
            "How does sleep affect aging?",
            &used
        ));
    }

    #[test]
    fn test_rejects_previously_used_queries() {
        let used = vec![
            "original question".to_string(),
            "earlier rewrite of the question".to_string(),
        ];

        assert!(!is_acceptable_reformulation(
            "Earlier rewrite of the question",
            "original question",
            &used
        ));
    }

    #[test]
    fn test_keyword_expansion_uses_first_matching_group() {
        let question = "Does exercise improve VO2 max?";
        let used = vec![question.to_string()];

        assert_eq!(
            keyword_expansion(question, &used).unwrap(),
            "Does exercise improve VO2 max? physical activity aerobic"
        );
    }

    #[test]
    fn test_keyword_expansion_moves_to_next_group() {
        let question = "Does exercise improve VO2 max?";
        let used = vec![
            question.to_string(),
            "Does exercise improve VO2 max? physical activity aerobic".to_string(),
        ];

        assert_eq!(
            keyword_expansion(question, &used).unwrap(),
            "Does exercise improve VO2 max? cardiorespiratory fitness aerobic capacity"
        );
    }

    #[test]
    fn test_keyword_expansion_general_terms() {
        let question = "What is autophagy?";

        assert_eq!(
            keyword_expansion(question, &[question.to_string()]).unwrap(),
            "What is autophagy? aging longevity"
        );
    }

    #[test]
    fn test_keyword_expansion_exhausted() {
        let question = "What is autophagy?";
        let used = vec![
            question.to_string(),
            "What is autophagy? aging longevity".to_string(),
        ];

        let failure = keyword_expansion(question, &used).unwrap_err();
        assert!(failure.to_string().starts_with("Reformulation failed"));
    }
}

//! User query and the hints used by the filtered pass

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::filter::{FilterBuilder, MetadataFilter};

/// Optional filter hints supplied alongside the question
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_type: Option<String>,
}

impl QueryHints {
    /// Hints from raw user input; blank values are dropped
    pub fn new(topic: Option<&str>, study_type: Option<&str>) -> Self {
        Self {
            topic: non_blank(topic),
            study_type: non_blank(study_type),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topic.is_none() && self.study_type.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A question issued to the controller
///
/// Immutable once issued: reformulation produces a new `Query` that keeps
/// the hints of the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
    #[serde(default, skip_serializing_if = "QueryHints::is_empty")]
    hints: QueryHints,
}

/// Study type patterns, checked in priority order
static STUDY_TYPE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bmeta-analys[ie]s\b|\bsystematic reviews?\b", "meta-analysis"),
        (r"\brandomi[sz]ed\b|\brcts?\b|\bclinical trials?\b", "rct"),
        (r"\bcohort\b|\bobservational\b|\blongitudinal\b", "observational"),
    ]
    .into_iter()
    .filter_map(|(pattern, label)| Regex::new(pattern).ok().map(|re| (re, label)))
    .collect()
});

/// Topic and biomarker keys with the words that signal them
const AUGMENTATION_TERMS: &[(&str, &[&str])] = &[
    ("cardiovascular", &["cardiovascular", "heart", "blood pressure"]),
    ("sleep", &["sleep", "circadian"]),
    ("exercise", &["exercise", "training", "fitness"]),
    ("nutrition", &["nutrition", "diet", "caloric"]),
    ("longevity", &["longevity", "aging", "lifespan"]),
    ("vo2_max", &["vo2", "oxygen consumption"]),
    ("heart_rate", &["resting heart"]),
    ("blood_pressure", &["blood pressure"]),
    ("sleep_metrics", &["sleep"]),
];

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hints: QueryHints::default(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.hints.topic = Some(topic.into());
        self
    }

    pub fn with_study_type(mut self, study_type: impl Into<String>) -> Self {
        self.hints.study_type = Some(study_type.into());
        self
    }

    pub fn with_hints(mut self, hints: QueryHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn hints(&self) -> &QueryHints {
        &self.hints
    }

    /// A new query with different text and the same hints
    pub fn rephrased(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hints: self.hints.clone(),
        }
    }

    /// Study type inferred from the question wording
    pub fn inferred_study_type(&self) -> Option<&'static str> {
        let lower = self.text.to_lowercase();
        STUDY_TYPE_PATTERNS
            .iter()
            .find(|(re, _)| re.is_match(&lower))
            .map(|(_, label)| *label)
    }

    /// Metadata filter for the filtered pass
    ///
    /// The explicit study type wins over the inferred one. The topic is only
    /// ever taken from the hint.
    pub fn filter(&self) -> Option<MetadataFilter> {
        let mut builder = FilterBuilder::new();

        let study_type = non_blank(self.hints.study_type.as_deref())
            .or_else(|| self.inferred_study_type().map(str::to_string));
        if let Some(study_type) = study_type {
            builder = builder.eq("study_type", study_type);
        }
        if let Some(topic) = non_blank(self.hints.topic.as_deref()) {
            builder = builder.contains("topic", topic);
        }

        builder.build()
    }

    /// Topic and biomarker keys detected in the question, in table order
    pub fn augmentation_terms(&self) -> Vec<&'static str> {
        let lower = self.text.to_lowercase();
        AUGMENTATION_TERMS
            .iter()
            .filter(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(key, _)| *key)
            .collect()
    }

    /// Question text followed by its augmentation terms
    pub fn augmented_text(&self) -> String {
        let terms = self.augmentation_terms();
        if terms.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.text, terms.join(" "))
        }
    }
}

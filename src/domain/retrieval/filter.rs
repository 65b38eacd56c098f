//! Metadata filters applied by the filtered retrieval pass

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operators for metadata filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equal to, ignoring ASCII case
    Eq,
    /// Substring of a string field, or element of an array field
    Contains,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Contains => write!(f, "contains"),
        }
    }
}

/// A single filter condition on a string metadata field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Metadata field key
    pub key: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterCondition {
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: FilterOperator::Eq,
            value: value.into(),
        }
    }

    pub fn contains(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: FilterOperator::Contains,
            value: value.into(),
        }
    }

    /// Evaluate this condition against chunk metadata
    pub fn matches(&self, metadata: &HashMap<String, serde_json::Value>) -> bool {
        let Some(field) = metadata.get(&self.key) else {
            return false;
        };

        match (self.operator, field) {
            (FilterOperator::Eq, serde_json::Value::String(s)) => {
                s.eq_ignore_ascii_case(&self.value)
            }
            (FilterOperator::Contains, serde_json::Value::String(s)) => {
                s.to_lowercase().contains(&self.value.to_lowercase())
            }
            (FilterOperator::Contains, serde_json::Value::Array(items)) => items
                .iter()
                .any(|item| item.as_str().is_some_and(|s| s.eq_ignore_ascii_case(&self.value))),
            _ => false,
        }
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.operator, self.value)
    }
}

/// Conditions that must all hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    conditions: Vec<FilterCondition>,
}

impl MetadataFilter {
    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    /// Evaluate the filter against chunk metadata
    pub fn matches(&self, metadata: &HashMap<String, serde_json::Value>) -> bool {
        self.conditions.iter().all(|c| c.matches(metadata))
    }

    /// Human readable description of every condition, in order
    pub fn describe(&self) -> Vec<String> {
        self.conditions.iter().map(ToString::to_string).collect()
    }
}

/// Builder for metadata filters
#[derive(Debug, Default)]
pub struct FilterBuilder {
    conditions: Vec<FilterCondition>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(FilterCondition::eq(key, value));
        self
    }

    pub fn contains(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(FilterCondition::contains(key, value));
        self
    }

    /// Build the final filter, `None` when no condition was added
    pub fn build(self) -> Option<MetadataFilter> {
        if self.conditions.is_empty() {
            None
        } else {
            Some(MetadataFilter {
                conditions: self.conditions,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(pairs: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_filter_builder() {
        assert!(FilterBuilder::new().build().is_none());

        let filter = FilterBuilder::new()
            .eq("study_type", "rct")
            .contains("topic", "sleep")
            .build()
            .unwrap();

        assert_eq!(filter.conditions().len(), 2);
        assert_eq!(filter.conditions()[0].operator, FilterOperator::Eq);
        assert_eq!(filter.conditions()[1].operator, FilterOperator::Contains);
    }

    #[test]
    fn test_eq_is_case_insensitive_for_strings() {
        let meta = metadata(&[("study_type", json!("RCT")), ("year", json!(2021))]);

        assert!(FilterCondition::eq("study_type", "rct").matches(&meta));
        assert!(!FilterCondition::eq("study_type", "observational").matches(&meta));
        assert!(!FilterCondition::eq("missing", "rct").matches(&meta));
        assert!(!FilterCondition::eq("year", "2021").matches(&meta));
    }

    #[test]
    fn test_contains_on_string_and_array() {
        let meta = metadata(&[
            ("title", json!("Sleep duration and mortality")),
            ("topic", json!(["sleep", "longevity"])),
        ]);

        assert!(FilterCondition::contains("title", "mortality").matches(&meta));
        assert!(FilterCondition::contains("topic", "Sleep").matches(&meta));
        assert!(!FilterCondition::contains("topic", "exercise").matches(&meta));
    }

    #[test]
    fn test_all_conditions_must_match() {
        let meta = metadata(&[("study_type", json!("rct")), ("topic", json!(["sleep"]))]);

        let both = FilterBuilder::new()
            .eq("study_type", "rct")
            .contains("topic", "sleep")
            .build()
            .unwrap();
        let mismatch = FilterBuilder::new()
            .eq("study_type", "rct")
            .contains("topic", "exercise")
            .build()
            .unwrap();

        assert!(both.matches(&meta));
        assert!(!mismatch.matches(&meta));
    }

    #[test]
    fn test_describe() {
        let filter = FilterBuilder::new()
            .eq("study_type", "meta-analysis")
            .contains("topic", "sleep")
            .build()
            .unwrap();

        assert_eq!(
            filter.describe(),
            vec!["study_type = meta-analysis", "topic contains sleep"]
        );
    }
}

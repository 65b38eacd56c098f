//! Audit trail of one controller run

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use super::decision::{Decision, DecisionStatus};
use super::pass::{PassResult, Strategy};

/// Trace under construction, owned by the controller for one query
#[derive(Debug)]
pub struct TraceRecorder {
    query_id: Uuid,
    query: String,
    started_at: DateTime<Utc>,
    passes: Vec<PassResult>,
}

impl TraceRecorder {
    pub fn start(query: impl Into<String>) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            query: query.into(),
            started_at: Utc::now(),
            passes: Vec::new(),
        }
    }

    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Index the next recorded pass must carry
    pub fn next_pass_index(&self) -> u32 {
        self.passes.len() as u32 + 1
    }

    pub fn passes(&self) -> &[PassResult] {
        &self.passes
    }

    /// Append a pass; its index must follow the last one
    pub fn record(&mut self, pass: PassResult) {
        debug_assert_eq!(pass.pass_index, self.next_pass_index());
        self.passes.push(pass);
    }

    /// Lowest scoring pass so far; the earliest one wins ties
    pub fn weakest_pass(&self) -> Option<&PassResult> {
        self.passes.iter().reduce(|weakest, pass| {
            if pass.score < weakest.score {
                pass
            } else {
                weakest
            }
        })
    }

    /// Every query text sent to the retriever, plus the original question
    pub fn used_queries(&self) -> Vec<String> {
        let mut used = vec![self.query.clone()];
        for pass in &self.passes {
            if !used.contains(&pass.query_used) {
                used.push(pass.query_used.clone());
            }
        }
        used
    }

    /// Seal the trace with its terminal decision
    pub fn finish(self, decision: Decision) -> Trace {
        debug_assert!(decision.is_terminal());
        Trace {
            query_id: self.query_id,
            query: self.query,
            started_at: self.started_at,
            finished_at: Utc::now(),
            passes: self.passes,
            decision,
        }
    }
}

/// Completed, immutable trace
#[derive(Debug, Clone)]
pub struct Trace {
    query_id: Uuid,
    query: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    passes: Vec<PassResult>,
    decision: Decision,
}

impl Trace {
    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn passes(&self) -> &[PassResult] {
        &self.passes
    }

    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    pub fn summary(&self) -> TraceSummary<'_> {
        TraceSummary {
            query_id: self.query_id,
            query: &self.query,
            started_at: self.started_at,
            finished_at: self.finished_at,
            passes: self.passes.iter().map(PassSummary::from).collect(),
            decision: DecisionSummary {
                status: self.decision.status,
                rationale: &self.decision.rationale,
                failure: self.decision.failure.as_ref().map(|f| f.reason.as_str()),
            },
        }
    }
}

impl Serialize for Trace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.summary().serialize(serializer)
    }
}

/// Compact, serializable view of a trace
#[derive(Debug, Serialize)]
pub struct TraceSummary<'a> {
    pub query_id: Uuid,
    pub query: &'a str,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub passes: Vec<PassSummary<'a>>,
    pub decision: DecisionSummary<'a>,
}

#[derive(Debug, Serialize)]
pub struct PassSummary<'a> {
    pub pass_index: u32,
    pub strategy: Strategy,
    pub query_used: &'a str,
    pub score: f32,
    pub chunk_count: usize,
    pub semantic_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge_score: Option<f32>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    pub filters: &'a [String],
    #[serde(skip_serializing_if = "is_empty_slice")]
    pub degradations: &'a [String],
}

fn is_empty_slice(items: &&[String]) -> bool {
    items.is_empty()
}

impl<'a> From<&'a PassResult> for PassSummary<'a> {
    fn from(pass: &'a PassResult) -> Self {
        Self {
            pass_index: pass.pass_index,
            strategy: pass.strategy,
            query_used: &pass.query_used,
            score: pass.score,
            chunk_count: pass.chunk_count(),
            semantic_score: pass.semantic_score,
            judge_score: pass.judge_score,
            filters: &pass.filters,
            degradations: &pass.degradations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DecisionSummary<'a> {
    pub status: DecisionStatus,
    pub rationale: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::controller::Policy;

    fn pass(index: u32, score: f32, query: &str) -> PassResult {
        PassResult {
            pass_index: index,
            strategy: if index == 1 {
                Strategy::Semantic
            } else {
                Strategy::Reformulated
            },
            query_used: query.to_string(),
            chunks: Vec::new(),
            score,
            semantic_score: score,
            judge_score: None,
            judge_rationale: String::new(),
            filters: Vec::new(),
            degradations: Vec::new(),
        }
    }

    #[test]
    fn test_recorder_indices_and_weakest() {
        let mut recorder = TraceRecorder::start("question");
        assert_eq!(recorder.next_pass_index(), 1);

        recorder.record(pass(1, 0.3, "question"));
        recorder.record(pass(2, 0.2, "question rewritten"));
        recorder.record(pass(3, 0.2, "question rewritten again"));

        assert_eq!(recorder.next_pass_index(), 4);
        assert_eq!(recorder.weakest_pass().map(|p| p.pass_index), Some(2));
        assert_eq!(
            recorder.used_queries(),
            vec!["question", "question rewritten", "question rewritten again"]
        );
    }

    #[test]
    fn test_finished_trace_serialization() {
        let mut recorder = TraceRecorder::start("question");
        let first = pass(1, 0.9, "question");
        recorder.record(first.clone());

        let trace = recorder.finish(Decision::evaluate(&Policy::default(), &first));
        let json = serde_json::to_value(&trace).unwrap();

        assert_eq!(json["query"], "question");
        assert_eq!(json["passes"][0]["pass_index"], 1);
        assert_eq!(json["passes"][0]["strategy"], "semantic");
        assert_eq!(json["passes"][0]["chunk_count"], 0);
        assert_eq!(json["decision"]["status"], "terminate_success");
        assert!(json["passes"][0].get("filters").is_none());
        assert!(trace.finished_at() >= trace.started_at());
    }
}

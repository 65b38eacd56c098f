//! Controller decisions and the policy transition table

use serde::{Deserialize, Serialize};

use super::pass::{PassResult, Strategy};
use super::policy::Policy;
use super::reformulator::ReformulationFailure;

/// Outcome category of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    TerminateSuccess,
    TerminateImpossible,
    Continue,
    Cancelled,
}

impl DecisionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// A decision taken after a pass (or on cancellation)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub status: DecisionStatus,
    pub rationale: String,
    /// Strategy of the next pass, for `Continue`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_strategy: Option<Strategy>,
    /// Set when reformulation could not produce a new query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ReformulationFailure>,
    /// Pass that triggered the decision
    #[serde(skip)]
    pub pass: Option<PassResult>,
}

impl Decision {
    /// Apply the policy to a finished pass
    pub fn evaluate(policy: &Policy, pass: &PassResult) -> Self {
        let score = pass.score;
        let n = pass.pass_index;
        let has_budget = n < policy.max_passes();

        if score >= policy.high_confidence_threshold() {
            return Self::terminal(
                DecisionStatus::TerminateSuccess,
                format!(
                    "high confidence: score {score:.3} >= {:.3}",
                    policy.high_confidence_threshold()
                ),
                pass,
            );
        }
        if score >= policy.min_relevance_score() {
            return Self::terminal(
                DecisionStatus::TerminateSuccess,
                format!(
                    "acceptable confidence: score {score:.3} >= {:.3}",
                    policy.min_relevance_score()
                ),
                pass,
            );
        }

        let next_strategy = if n == 1 && policy.enable_filtered_retry() && has_budget {
            Some(Strategy::Filtered)
        } else if policy.enable_semantic_retry() && has_budget {
            Some(Strategy::Reformulated)
        } else {
            None
        };

        match next_strategy {
            Some(strategy) => Self {
                status: DecisionStatus::Continue,
                rationale: format!(
                    "score {score:.3} below {:.3}, escalating to {strategy} pass",
                    policy.min_relevance_score()
                ),
                next_strategy: Some(strategy),
                failure: None,
                pass: Some(pass.clone()),
            },
            None => Self::terminal(
                DecisionStatus::TerminateImpossible,
                format!(
                    "exhausted passes below threshold: score {score:.3} < {:.3} after {n} pass(es)",
                    policy.min_relevance_score()
                ),
                pass,
            ),
        }
    }

    /// Terminal decision when no alternative query could be produced
    pub fn reformulation_failed(pass: &PassResult, failure: ReformulationFailure) -> Self {
        Self {
            status: DecisionStatus::TerminateImpossible,
            rationale: format!("no alternative query: {}", failure.reason),
            next_strategy: None,
            failure: Some(failure),
            pass: Some(pass.clone()),
        }
    }

    /// Terminal decision when the caller cancelled between passes
    pub fn cancelled(last_pass: Option<&PassResult>) -> Self {
        let completed = last_pass.map_or(0, |pass| pass.pass_index);
        Self {
            status: DecisionStatus::Cancelled,
            rationale: format!("cancelled after {completed} pass(es)"),
            next_strategy: None,
            failure: None,
            pass: last_pass.cloned(),
        }
    }

    fn terminal(status: DecisionStatus, rationale: String, pass: &PassResult) -> Self {
        Self {
            status,
            rationale,
            next_strategy: None,
            failure: None,
            pass: Some(pass.clone()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_success(&self) -> bool {
        self.status == DecisionStatus::TerminateSuccess
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(index: u32, score: f32) -> PassResult {
        PassResult {
            pass_index: index,
            strategy: Strategy::Semantic,
            query_used: "q".to_string(),
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
    fn test_high_confidence_success() {
        let decision = Decision::evaluate(&Policy::default(), &pass(1, 0.85));

        assert_eq!(decision.status, DecisionStatus::TerminateSuccess);
        assert!(decision.rationale.starts_with("high confidence"));
        assert_eq!(decision.pass.as_ref().map(|p| p.pass_index), Some(1));
    }

    #[test]
    fn test_acceptable_confidence_success() {
        let decision = Decision::evaluate(&Policy::default(), &pass(2, 0.6));

        assert!(decision.is_success());
        assert!(decision.rationale.starts_with("acceptable confidence"));
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let policy = Policy::default();

        assert!(Decision::evaluate(&policy, &pass(1, 0.8))
            .rationale
            .starts_with("high confidence"));
        assert!(Decision::evaluate(&policy, &pass(1, 0.5)).is_success());
    }

    #[test]
    fn test_first_pass_escalates_to_filtered() {
        let decision = Decision::evaluate(&Policy::default(), &pass(1, 0.4));

        assert_eq!(decision.status, DecisionStatus::Continue);
        assert_eq!(decision.next_strategy, Some(Strategy::Filtered));
    }

    #[test]
    fn test_later_pass_escalates_to_reformulated() {
        let decision = Decision::evaluate(&Policy::default(), &pass(2, 0.4));
        assert_eq!(decision.next_strategy, Some(Strategy::Reformulated));
    }

    #[test]
    fn test_filtered_disabled_goes_to_reformulated() {
        let policy = Policy::new(0.5, 0.8, 3, false, true).unwrap();
        let decision = Decision::evaluate(&policy, &pass(1, 0.3));

        assert_eq!(decision.next_strategy, Some(Strategy::Reformulated));
    }

    #[test]
    fn test_exhausted_budget_is_impossible() {
        let decision = Decision::evaluate(&Policy::default(), &pass(3, 0.4));

        assert_eq!(decision.status, DecisionStatus::TerminateImpossible);
        assert!(decision.rationale.starts_with("exhausted passes below threshold"));
    }

    #[test]
    fn test_both_flags_off_terminates_after_first_pass() {
        let policy = Policy::new(0.5, 0.8, 3, false, false).unwrap();

        assert_eq!(
            Decision::evaluate(&policy, &pass(1, 0.1)).status,
            DecisionStatus::TerminateImpossible
        );
        assert!(Decision::evaluate(&policy, &pass(1, 0.7)).is_success());
    }

    #[test]
    fn test_single_pass_budget() {
        let policy = Policy::new(0.5, 0.8, 1, true, true).unwrap();
        let decision = Decision::evaluate(&policy, &pass(1, 0.1));

        assert_eq!(decision.status, DecisionStatus::TerminateImpossible);
    }

    #[test]
    fn test_reformulation_failure_decision() {
        let decision = Decision::reformulation_failed(
            &pass(2, 0.2),
            ReformulationFailure::new("nothing left to try"),
        );

        assert_eq!(decision.status, DecisionStatus::TerminateImpossible);
        assert!(decision.failure.is_some());
        assert!(decision.is_terminal());
    }

    #[test]
    fn test_cancelled_decision() {
        let decision = Decision::cancelled(Some(&pass(1, 0.2)));

        assert_eq!(decision.status, DecisionStatus::Cancelled);
        assert_eq!(decision.rationale, "cancelled after 1 pass(es)");
    }

    #[test]
    fn test_serialization_skips_pass() {
        let decision = Decision::evaluate(&Policy::default(), &pass(1, 0.9));
        let json = serde_json::to_value(&decision).unwrap();

        assert_eq!(json["status"], "terminate_success");
        assert!(json.get("pass").is_none());
        assert!(json.get("failure").is_none());
    }
}

//! Adaptive retrieval controller domain
//!
//! Policy, pass results, decisions and traces, plus the capability traits the
//! controller drives: similarity scoring, relevance judging, reformulation
//! and answer generation.

mod decision;
mod generator;
mod judge;
mod pass;
mod policy;
mod reformulator;
mod scorer;
mod trace;

pub use decision::{Decision, DecisionStatus};
pub use generator::AnswerGenerator;
pub use judge::{Assessment, RelevanceJudge};
pub use pass::{PassResult, ScoredChunk, Strategy};
pub use policy::{Policy, PolicyConfig, PolicyViolation};
pub use reformulator::{
    is_acceptable_reformulation, keyword_expansion, KeywordReformulator, QueryReformulator,
    ReformulationFailure,
};
pub use scorer::{
    Aggregation, ChunkSimilarity, ScoringConfig, SimilarityScorer, NEUTRAL_SIMILARITY,
};
pub use trace::{DecisionSummary, PassSummary, Trace, TraceRecorder, TraceSummary};

#[cfg(test)]
pub use generator::MockAnswerGenerator;
#[cfg(test)]
pub use judge::mock::MockJudge;
#[cfg(test)]
pub use reformulator::mock::MockReformulator;

//! Controller wiring: re-ranking, the pass loop and LLM-backed collaborators

mod decision_controller;
mod llm_generator;
mod llm_judge;
mod llm_reformulator;
mod reranker;

pub use decision_controller::{AnswerOutcome, DecisionController, DecisionControllerBuilder};
pub use llm_generator::LlmAnswerGenerator;
pub use llm_judge::LlmRelevanceJudge;
pub use llm_reformulator::LlmQueryReformulator;
pub use reranker::{RankedCandidates, Reranker, RetrievalConfig};

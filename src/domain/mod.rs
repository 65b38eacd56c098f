//! Domain layer - Core retrieval control logic and entities

pub mod controller;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod retrieval;

pub use controller::{
    Aggregation, AnswerGenerator, Assessment, Decision, DecisionStatus, PassResult, Policy,
    PolicyConfig, PolicyViolation, QueryReformulator, ReformulationFailure, RelevanceJudge,
    ScoredChunk, ScoringConfig, SimilarityScorer, Strategy, Trace,
};
pub use embedding::Embedder;
pub use error::DomainError;
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole,
    Usage,
};
pub use retrieval::{Chunk, MetadataFilter, Query, QueryHints, Retriever, SearchParams};

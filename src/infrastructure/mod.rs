//! Infrastructure layer - External service implementations

pub mod controller;
pub mod embedding;
pub mod llm;
pub mod logging;
pub mod retrieval;
pub mod retry;

//! Wire types for the HTTP API

pub mod answer;
pub mod error;
pub mod json;

pub use answer::{AnswerRequest, AnswerResponse, ContextChunk};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;

//! Embedding provider implementations

mod openai;

pub use openai::{OpenAiEmbedder, DEFAULT_EMBEDDING_MODEL};

//! Embedding domain: the embedder capability and vector similarity

mod embedder;
mod similarity;

pub use embedder::Embedder;
pub use similarity::{cosine_similarity, is_usable_vector};

#[cfg(test)]
pub use embedder::mock::MockEmbedder;

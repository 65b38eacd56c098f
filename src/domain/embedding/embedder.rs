//! Embedder trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Turns text into fixed-dimensionality vectors
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    /// Embed a batch of texts, returning one vector per input in order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;

        vectors
            .pop()
            .ok_or_else(|| DomainError::scoring("Embedder returned no vector"))
    }

    /// Get the embedder name
    fn embedder_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock embedder with fixed vectors per text
    ///
    /// Texts without a registered vector get a deterministic vector derived
    /// from their bytes.
    #[derive(Debug)]
    pub struct MockEmbedder {
        dimensions: usize,
        vectors: HashMap<String, Vec<f32>>,
        error: Option<String>,
        calls: AtomicUsize,
    }

    impl MockEmbedder {
        pub fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                vectors: HashMap::new(),
                error: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.vectors.insert(text.into(), vector);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hashed_vector(&self, text: &str) -> Vec<f32> {
            let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
            (0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64) % 1000) as f32 / 1000.0) - 0.5)
                .collect()
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock_embedder", error));
            }

            Ok(texts
                .iter()
                .map(|text| {
                    self.vectors
                        .get(text)
                        .cloned()
                        .unwrap_or_else(|| self.hashed_vector(text))
                })
                .collect())
        }

        fn embedder_name(&self) -> &'static str {
            "mock"
        }
    }

    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_registered_vector_is_returned() {
            let embedder = MockEmbedder::new(3).with_vector("hello", vec![1.0, 0.0, 0.0]);

            let vector = embedder.embed("hello").await.unwrap();

            assert_eq!(vector, vec![1.0, 0.0, 0.0]);
        }

        #[tokio::test]
        async fn test_deterministic_embeddings() {
            let embedder = MockEmbedder::new(8);

            let first = embedder.embed("same text").await.unwrap();
            let second = embedder.embed("same text").await.unwrap();

            assert_eq!(first, second);
            assert_eq!(first.len(), 8);
            assert_eq!(embedder.call_count(), 2);
        }

        #[tokio::test]
        async fn test_error() {
            let embedder = MockEmbedder::new(8).with_error("API error");

            assert!(embedder.embed("hello").await.is_err());
        }
    }
}

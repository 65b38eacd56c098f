//! Retriever trait - the seam to the vector index

use std::fmt::Debug;

use async_trait::async_trait;

use super::chunk::Chunk;
use super::filter::MetadataFilter;
use crate::domain::DomainError;

/// Search parameters for a retrieval call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Query text to search for
    pub query: String,
    /// Number of candidates to return
    pub top_k: usize,
    /// Optional metadata filter
    pub filter: Option<MetadataFilter>,
}

impl SearchParams {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<MetadataFilter>) -> Self {
        self.filter = filter;
        self
    }
}

/// Provider trait for candidate retrieval
///
/// Implementations return at most `top_k` chunks ordered by their native
/// ranking. Errors are reported as `DomainError::Retrieval` (or `Timeout`) so
/// the caller can retry them.
#[async_trait]
pub trait Retriever: Send + Sync + Debug {
    /// Search the index
    async fn search(&self, params: SearchParams) -> Result<Vec<Chunk>, DomainError>;

    /// Get the retriever name
    fn retriever_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock retriever answering from a queue of canned responses
    ///
    /// The last queued response is repeated once the queue drains.
    #[derive(Debug)]
    pub struct MockRetriever {
        responses: Mutex<VecDeque<Result<Vec<Chunk>, String>>>,
        delay: Option<Duration>,
        calls: Mutex<Vec<SearchParams>>,
    }

    impl MockRetriever {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                delay: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_chunks(self, chunks: Vec<Chunk>) -> Self {
            self.responses.lock().unwrap().push_back(Ok(chunks));
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            self.responses.lock().unwrap().push_back(Err(error.into()));
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<SearchParams> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Default for MockRetriever {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Retriever for MockRetriever {
        async fn search(&self, params: SearchParams) -> Result<Vec<Chunk>, DomainError> {
            let top_k = params.top_k;
            self.calls.lock().unwrap().push(params);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let response = {
                let mut responses = self.responses.lock().unwrap();
                if responses.len() > 1 {
                    responses.pop_front()
                } else {
                    responses.front().cloned()
                }
            };

            match response {
                Some(Ok(mut chunks)) => {
                    chunks.truncate(top_k);
                    Ok(chunks)
                }
                Some(Err(error)) => Err(DomainError::retrieval(error)),
                None => Ok(Vec::new()),
            }
        }

        fn retriever_name(&self) -> &'static str {
            "mock"
        }
    }

    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_responses_are_consumed_in_order() {
            let retriever = MockRetriever::new()
                .with_error("connection reset")
                .with_chunks(vec![Chunk::new("c1", "d1", "text")]);

            assert!(retriever.search(SearchParams::new("q", 3)).await.is_err());
            let chunks = retriever.search(SearchParams::new("q", 3)).await.unwrap();
            assert_eq!(chunks.len(), 1);

            let again = retriever.search(SearchParams::new("q", 3)).await.unwrap();
            assert_eq!(again.len(), 1);
            assert_eq!(retriever.call_count(), 3);
        }

        #[tokio::test]
        async fn test_truncates_to_top_k() {
            let chunks = (0..5)
                .map(|i| Chunk::new(format!("c{i}"), "d1", "text"))
                .collect();
            let retriever = MockRetriever::new().with_chunks(chunks);

            let result = retriever.search(SearchParams::new("q", 2)).await.unwrap();

            assert_eq!(result.len(), 2);
            assert_eq!(retriever.calls()[0].top_k, 2);
        }
    }
}

//! Relevance judge seam

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::retrieval::Chunk;
use crate::domain::DomainError;

/// Judge verdict on a context set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Score in [0, 1]
    pub score: f32,
    pub rationale: String,
}

impl Assessment {
    pub fn new(score: f32, rationale: impl Into<String>) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            rationale: rationale.into(),
        }
    }
}

/// Independent estimate of whether a context set answers a question
///
/// Chunks arrive best first and are only borrowed.
#[async_trait]
pub trait RelevanceJudge: Send + Sync + Debug {
    async fn assess(
        &self,
        question: &str,
        chunks: &[&Chunk],
    ) -> Result<Assessment, DomainError>;

    fn judge_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock judge answering from a queue of verdicts
    ///
    /// The last verdict repeats once the queue drains.
    #[derive(Debug, Default)]
    pub struct MockJudge {
        verdicts: Mutex<VecDeque<(Result<Assessment, String>, Option<Duration>)>>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl MockJudge {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_score(self, score: f32) -> Self {
            self.push(Ok(Assessment::new(score, format!("mock verdict {score}"))), None)
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            self.push(Err(error.into()), None)
        }

        /// A verdict that only arrives after `delay`
        pub fn with_slow_score(self, score: f32, delay: Duration) -> Self {
            self.push(Ok(Assessment::new(score, "slow verdict")), Some(delay))
        }

        fn push(self, verdict: Result<Assessment, String>, delay: Option<Duration>) -> Self {
            self.verdicts.lock().unwrap().push_back((verdict, delay));
            self
        }

        pub fn call_count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        /// Chunk ids passed to each call, in order
        pub fn seen_chunk_ids(&self) -> Vec<Vec<String>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RelevanceJudge for MockJudge {
        async fn assess(
            &self,
            _question: &str,
            chunks: &[&Chunk],
        ) -> Result<Assessment, DomainError> {
            self.seen
                .lock()
                .unwrap()
                .push(chunks.iter().map(|chunk| chunk.id.clone()).collect());

            let next = {
                let mut verdicts = self.verdicts.lock().unwrap();
                if verdicts.len() > 1 {
                    verdicts.pop_front()
                } else {
                    verdicts.front().cloned()
                }
            };

            let Some((verdict, delay)) = next else {
                return Err(DomainError::judge("no verdict configured"));
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            verdict.map_err(DomainError::judge)
        }

        fn judge_name(&self) -> &'static str {
            "mock"
        }
    }
}

use std::fmt::Debug;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::retrieval::Chunk;
use crate::domain::DomainError;

/// Writes the final answer from the accepted context
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnswerGenerator: Send + Sync + Debug {
    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String, DomainError>;

    fn generator_name(&self) -> &'static str;
}

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::controller::AnswerGenerator;
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::retrieval::Chunk;
use crate::domain::DomainError;

const RAG_SYSTEM_PROMPT: &str = "You are a domain-expert research assistant. Answer the user's \
question using only the provided context.\n\n\
Structure the answer as:\n\
- Answer: a succinct summary.\n\
- Details: methods, populations, effect sizes and metrics from the context.\n\
- Citations: reference the source, section or page of each claim, e.g. (paper-12, p. 5).\n\
- Limitations: when the context is incomplete, start with \"Based on the provided context\" and name the gaps.\n\n\
Preserve the original terminology and keep findings, hypotheses and methodology distinct.";

/// Answer generator using the RAG prompt over the accepted context
#[derive(Debug)]
pub struct LlmAnswerGenerator<P>
where
    P: LlmProvider,
{
    provider: Arc<P>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl<P: LlmProvider> LlmAnswerGenerator<P> {
    pub fn new(provider: Arc<P>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: 800,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn format_context(context: &[Chunk]) -> String {
        context
            .iter()
            .map(|chunk| {
                let mut label = chunk.document_id.clone();
                if let Some(section) = &chunk.section {
                    label.push_str(&format!(", {}", section));
                }
                if let Some(page) = chunk.page {
                    label.push_str(&format!(", p. {}", page));
                }
                format!("[{}]\n{}", label, chunk.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
impl<P: LlmProvider> AnswerGenerator for LlmAnswerGenerator<P> {
    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String, DomainError> {
        let request = LlmRequest::builder()
            .system(RAG_SYSTEM_PROMPT)
            .user(format!(
                "Context:\n{}\n\nQuestion:\n{}",
                Self::format_context(context),
                question
            ))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        response
            .content()
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| DomainError::provider(self.provider.provider_name(), "Empty answer"))
    }

    fn generator_name(&self) -> &'static str {
        "llm"
    }
}

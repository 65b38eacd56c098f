//! LLM-based relevance judge
//!
//! Asks a chat model whether the leading chunks of a pass can answer the
//! question, as a 0-10 score with a short reason.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::controller::{Assessment, RelevanceJudge};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::retrieval::Chunk;
use crate::domain::DomainError;

/// Chunks shown to the judge
const MAX_JUDGED_CHUNKS: usize = 3;
/// Context chars shown to the judge
const MAX_CONTEXT_CHARS: usize = 2000;

const JUDGE_PROMPT: &str = r#"You are evaluating whether the provided context contains sufficient information to answer the question.

Question: ${question}

Context:
${context}

Rate on a scale of 0 to 10 how well this context can answer the question:
- 10: comprehensive answer possible
- 7-9: can answer most aspects
- 4-6: partial, some relevant information
- 0-3: little to no relevant information

Respond with ONLY a JSON object: {"score": <0-10>, "reason": "<at most 10 words>"}"#;

/// Relevance judge backed by a chat model
#[derive(Debug)]
pub struct LlmRelevanceJudge<P>
where
    P: LlmProvider,
{
    provider: Arc<P>,
    model: String,
    temperature: f32,
}

impl<P: LlmProvider> LlmRelevanceJudge<P> {
    pub fn new(provider: Arc<P>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.1,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    fn build_prompt(&self, question: &str, chunks: &[&Chunk]) -> String {
        let joined = chunks
            .iter()
            .take(MAX_JUDGED_CHUNKS)
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let context: String = joined.chars().take(MAX_CONTEXT_CHARS).collect();

        JUDGE_PROMPT
            .replace("${question}", question)
            .replace("${context}", &context)
    }

    fn parse_verdict(&self, response: &str) -> Result<Assessment, DomainError> {
        let json_str = extract_json(response).unwrap_or(response);

        let verdict: JudgeVerdict = serde_json::from_str(json_str).map_err(|e| {
            warn!("Failed to parse judge response: {} - Response: {}", e, response);
            DomainError::judge(format!("Invalid judge response format: {}", e))
        })?;

        if !verdict.score.is_finite() {
            return Err(DomainError::judge("Judge score is not a number"));
        }

        Ok(Assessment::new(
            (verdict.score / 10.0).clamp(0.0, 1.0),
            verdict.reason.unwrap_or_else(|| "LLM assessment".to_string()),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct JudgeVerdict {
    score: f32,
    reason: Option<String>,
}

/// Extract the outermost JSON object from a string (handles code fences)
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[async_trait]
impl<P: LlmProvider> RelevanceJudge for LlmRelevanceJudge<P> {
    async fn assess(
        &self,
        question: &str,
        chunks: &[&Chunk],
    ) -> Result<Assessment, DomainError> {
        if chunks.is_empty() {
            return Ok(Assessment::new(0.0, "no context"));
        }

        let request = LlmRequest::builder()
            .user(self.build_prompt(question, chunks))
            .temperature(self.temperature)
            .max_tokens(60)
            .build();

        let response = self
            .provider
            .chat(&self.model, request)
            .await
            .map_err(|e| DomainError::judge(e.to_string()))?;

        let content = response
            .content()
            .ok_or_else(|| DomainError::judge("Empty response from LLM"))?;

        let assessment = self.parse_verdict(content)?;
        debug!(
            score = assessment.score,
            reason = %assessment.rationale,
            "Judge verdict"
        );

        Ok(assessment)
    }

    fn judge_name(&self) -> &'static str {
        "llm"
    }
}

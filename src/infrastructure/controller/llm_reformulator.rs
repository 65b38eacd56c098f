//! LLM-based query reformulator with a keyword-expansion fallback

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::controller::{
    is_acceptable_reformulation, keyword_expansion, PassResult, QueryReformulator,
    ReformulationFailure,
};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::retrieval::Query;

/// Weak-context chars included in the prompt
const MAX_WEAK_CONTEXT_CHARS: usize = 500;

const REFORMULATION_PROMPT: &str = r#"You are helping improve a search query for a longevity research database.

Original question: ${question}

${weak_context}
Reformulate this question to get better search results. Consider:
1. Adding relevant scientific or medical synonyms
2. Including related biomarkers or mechanisms
3. Using more specific terminology
4. Breaking complex questions into key concepts

Focus on longevity research topics such as aging, cardiovascular health, VO2 max, HRV, sleep quality, exercise, nutrition and biomarkers.

Respond with ONLY the reformulated question, no explanation."#;

/// Reformulator backed by a chat model
#[derive(Debug)]
pub struct LlmQueryReformulator<P>
where
    P: LlmProvider,
{
    provider: Arc<P>,
    model: String,
}

impl<P: LlmProvider> LlmQueryReformulator<P> {
    pub fn new(provider: Arc<P>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    fn build_prompt(&self, question: &str, weak_pass: &PassResult) -> String {
        let weak_context = if weak_pass.chunks.is_empty() {
            "Previous search returned no relevant results.\n".to_string()
        } else {
            let mut section = format!(
                "Previous search found limited relevant information:\n{}\n",
                weak_pass.context_text(MAX_WEAK_CONTEXT_CHARS)
            );
            if !weak_pass.judge_rationale.is_empty() {
                section.push_str(&format!("Reviewer note: {}\n", weak_pass.judge_rationale));
            }
            section
        };

        REFORMULATION_PROMPT
            .replace("${question}", question)
            .replace("${weak_context}", &weak_context)
    }

    async fn ask_model(&self, question: &str, weak_pass: &PassResult) -> Option<String> {
        let request = LlmRequest::builder()
            .user(self.build_prompt(question, weak_pass))
            .temperature(0.3)
            .max_tokens(100)
            .build();

        match self.provider.chat(&self.model, request).await {
            Ok(response) => response.content().map(|c| c.trim().to_string()),
            Err(e) => {
                warn!(error = %e, "Reformulation model failed, using keyword expansion");
                None
            }
        }
    }
}

#[async_trait]
impl<P: LlmProvider> QueryReformulator for LlmQueryReformulator<P> {
    async fn reformulate(
        &self,
        original: &Query,
        weak_pass: &PassResult,
        used_queries: &[String],
    ) -> Result<Query, ReformulationFailure> {
        if let Some(candidate) = self.ask_model(original.text(), weak_pass).await {
            if is_acceptable_reformulation(&candidate, original.text(), used_queries) {
                debug!(reformulated = %candidate, "Model reformulation accepted");
                return Ok(original.rephrased(candidate));
            }
            debug!(rejected = %candidate, "Model reformulation rejected");
        }

        keyword_expansion(original.text(), used_queries).map(|text| original.rephrased(text))
    }

    fn reformulator_name(&self) -> &'static str {
        "llm"
    }
}

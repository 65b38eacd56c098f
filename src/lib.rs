//! Evidence RAG
//!
//! Adaptive multi-pass retrieval over an indexed evidence corpus:
//! - Re-ranked semantic, filtered and reformulated retrieval passes
//! - Similarity scoring combined with an LLM relevance judge
//! - Policy-driven stop/continue decisions with an auditable trace
//! - Grounded answer generation from the accepted context

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::Embedder;
use infrastructure::{
    controller::{
        DecisionController, LlmAnswerGenerator, LlmQueryReformulator, LlmRelevanceJudge,
    },
    embedding::OpenAiEmbedder,
    llm::{HttpClient, OpenAiProvider},
    retrieval::InMemoryRetriever,
};
use tracing::info;

/// Wire the configured providers, index and controller together
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    config.validate()?;

    let openai = &config.providers.openai;
    let api_key = openai.resolve_api_key()?;
    let http = HttpClient::with_timeout(Duration::from_millis(openai.request_timeout_ms))?;

    let embedder: Arc<dyn Embedder> = Arc::new(
        OpenAiEmbedder::with_base_url(http.clone(), &api_key, &openai.base_url)
            .with_model(&openai.embedding_model),
    );
    let index = Arc::new(InMemoryRetriever::load(embedder.clone(), &config.index.path).await?);
    let provider = Arc::new(OpenAiProvider::with_base_url(http, &api_key, &openai.base_url));

    let mut builder = DecisionController::builder(index.clone(), embedder)
        .scoring(config.scoring)
        .retrieval(config.retrieval)
        .io(config.io);

    if config.providers.llm_judge {
        builder = builder.judge(Arc::new(LlmRelevanceJudge::new(
            provider.clone(),
            &openai.chat_model,
        )));
    }
    if config.providers.llm_reformulator {
        builder = builder.reformulator(Arc::new(LlmQueryReformulator::new(
            provider.clone(),
            &openai.chat_model,
        )));
    }
    if config.providers.generate_answers {
        builder = builder.generator(Arc::new(LlmAnswerGenerator::new(
            provider,
            &openai.chat_model,
        )));
    }

    info!(
        model = %openai.chat_model,
        embedding_model = %openai.embedding_model,
        judge = config.providers.llm_judge,
        llm_reformulator = config.providers.llm_reformulator,
        "Controller ready"
    );

    Ok(AppState::new(
        Arc::new(builder.build()?),
        config.policy,
        index,
    ))
}

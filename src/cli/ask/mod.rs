//! Ask command - answers one question from the terminal

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::api::types::{AnswerResponse, ContextChunk};
use crate::domain::{Policy, PolicyConfig, Query, QueryHints};
use crate::infrastructure::controller::AnswerOutcome;

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Question to answer
    pub question: String,

    /// Topic hint for the filtered pass
    #[arg(long)]
    pub topic: Option<String>,

    /// Study type hint for the filtered pass (e.g. rct, meta-analysis)
    #[arg(long)]
    pub study_type: Option<String>,

    /// Override the configured maximum number of passes
    #[arg(long)]
    pub max_passes: Option<u32>,

    /// Override the configured minimum relevance score
    #[arg(long)]
    pub min_relevance: Option<f32>,

    /// Override the configured high confidence threshold
    #[arg(long)]
    pub high_confidence: Option<f32>,

    /// Disable the filtered retry pass
    #[arg(long)]
    pub no_filtered_retry: bool,

    /// Disable reformulated retry passes
    #[arg(long)]
    pub no_semantic_retry: bool,

    /// Print the full response as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskArgs {
    /// Configured policy with the command line overrides applied
    fn policy(&self, configured: Policy) -> anyhow::Result<Policy> {
        let mut policy = PolicyConfig::from(configured);

        if let Some(max_passes) = self.max_passes {
            policy.max_passes = max_passes;
        }
        if let Some(min) = self.min_relevance {
            policy.min_relevance_score = min;
        }
        if let Some(high) = self.high_confidence {
            policy.high_confidence_threshold = high;
        }
        if self.no_filtered_retry {
            policy.enable_filtered_retry = false;
        }
        if self.no_semantic_retry {
            policy.enable_semantic_retry = false;
        }

        Ok(Policy::try_from(policy)?)
    }

    fn query(&self) -> Query {
        Query::new(self.question.trim()).with_hints(QueryHints::new(
            self.topic.as_deref(),
            self.study_type.as_deref(),
        ))
    }
}

pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let policy = args.policy(config.policy)?;

    let state = crate::create_app_state(&config).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping before the next pass");
            on_interrupt.cancel();
        }
    });

    let outcome = state
        .controller
        .answer_with_cancel(&args.query(), &policy, &cancel)
        .await;

    if args.json {
        let response = AnswerResponse {
            answer: outcome.answer.as_deref(),
            status: outcome.decision.status,
            final_context: outcome.final_context.iter().map(ContextChunk::from).collect(),
            trace: &outcome.trace,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render(&outcome));
    }

    Ok(())
}

/// Human readable report: passes, decision, answer and sources
fn render(outcome: &AnswerOutcome) -> String {
    let mut out = String::new();

    for pass in outcome.trace.passes() {
        out.push_str(&format!(
            "pass {} [{}] score {:.3} ({} chunks) query: {}\n",
            pass.pass_index,
            pass.strategy,
            pass.score,
            pass.chunk_count(),
            pass.query_used
        ));
        for note in &pass.degradations {
            out.push_str(&format!("  degraded: {}\n", note));
        }
    }
    out.push_str(&format!(
        "decision: {:?} - {}\n",
        outcome.decision.status, outcome.decision.rationale
    ));

    if let Some(answer) = &outcome.answer {
        out.push_str(&format!("\n{}\n", answer));
    }

    if !outcome.final_context.is_empty() {
        out.push_str("\nsources:\n");
        for chunk in &outcome.final_context {
            let page = chunk.page.map(|p| format!(", p. {}", p)).unwrap_or_default();
            out.push_str(&format!("  - {}{}\n", chunk.document_id, page));
        }
    }

    out
}

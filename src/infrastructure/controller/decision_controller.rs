//! Adaptive multi-pass retrieval controller
//!
//! Runs retrieval passes until the policy accepts a context set, runs out of
//! passes, cannot produce a new query, or is cancelled.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::reranker::{Reranker, RetrievalConfig};
use crate::domain::controller::{
    is_acceptable_reformulation, keyword_expansion, AnswerGenerator, Decision, KeywordReformulator,
    PassResult, Policy, QueryReformulator, ReformulationFailure, RelevanceJudge, ScoringConfig,
    SimilarityScorer, Strategy, Trace, TraceRecorder,
};
use crate::domain::retrieval::{Chunk, Query, Retriever};
use crate::domain::{DomainError, Embedder};
use crate::infrastructure::retry::{IoConfig, RetryPolicy};

/// Result of one controller run
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// Generated answer, only on success and when a generator is configured
    pub answer: Option<String>,
    /// Chunks of the accepted pass; empty unless the run succeeded
    pub final_context: Vec<Chunk>,
    pub decision: Decision,
    pub trace: Trace,
}

/// Builder for [`DecisionController`]
#[derive(Debug)]
pub struct DecisionControllerBuilder {
    retriever: Arc<dyn Retriever>,
    embedder: Arc<dyn Embedder>,
    judge: Option<Arc<dyn RelevanceJudge>>,
    reformulator: Arc<dyn QueryReformulator>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    scoring: ScoringConfig,
    retrieval: RetrievalConfig,
    io: IoConfig,
}

impl DecisionControllerBuilder {
    pub fn judge(mut self, judge: Arc<dyn RelevanceJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn reformulator(mut self, reformulator: Arc<dyn QueryReformulator>) -> Self {
        self.reformulator = reformulator;
        self
    }

    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn io(mut self, io: IoConfig) -> Self {
        self.io = io;
        self
    }

    /// Validate the configuration and build the controller
    pub fn build(self) -> Result<DecisionController, DomainError> {
        self.scoring.validate()?;
        self.retrieval.validate()?;
        self.io.validate()?;

        let retry = RetryPolicy::from_config(&self.io);
        let reranker = Reranker::new(
            self.retriever,
            self.embedder,
            SimilarityScorer::from_config(&self.scoring),
            self.retrieval,
            retry,
        );

        Ok(DecisionController {
            reranker,
            judge: self.judge,
            reformulator: self.reformulator,
            generator: self.generator,
            scoring: self.scoring,
            retry,
        })
    }
}

/// Retrieval plan for the next pass
#[derive(Debug, Clone)]
struct PassPlan {
    strategy: Strategy,
    query: Query,
}

/// Decision controller
///
/// Holds no per-query state: one instance serves concurrent queries, each
/// with its own trace.
#[derive(Debug)]
pub struct DecisionController {
    reranker: Reranker,
    judge: Option<Arc<dyn RelevanceJudge>>,
    reformulator: Arc<dyn QueryReformulator>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    scoring: ScoringConfig,
    retry: RetryPolicy,
}

impl DecisionController {
    pub fn builder(
        retriever: Arc<dyn Retriever>,
        embedder: Arc<dyn Embedder>,
    ) -> DecisionControllerBuilder {
        DecisionControllerBuilder {
            retriever,
            embedder,
            judge: None,
            reformulator: Arc::new(KeywordReformulator),
            generator: None,
            scoring: ScoringConfig::default(),
            retrieval: RetrievalConfig::default(),
            io: IoConfig::default(),
        }
    }

    /// Answer a query under `policy`
    pub async fn answer(&self, query: &Query, policy: &Policy) -> AnswerOutcome {
        self.answer_with_cancel(query, policy, &CancellationToken::new())
            .await
    }

    /// Answer a query, stopping before the next pass once `cancel` fires
    #[instrument(skip_all, fields(question = %query.text()))]
    pub async fn answer_with_cancel(
        &self,
        query: &Query,
        policy: &Policy,
        cancel: &CancellationToken,
    ) -> AnswerOutcome {
        let mut recorder = TraceRecorder::start(query.text());
        info!(
            query_id = %recorder.query_id(),
            max_passes = policy.max_passes(),
            "Starting retrieval controller"
        );

        let mut plan = PassPlan {
            strategy: Strategy::Semantic,
            query: query.clone(),
        };

        let decision = loop {
            if cancel.is_cancelled() {
                break Decision::cancelled(recorder.passes().last());
            }

            let pass = self
                .run_pass(recorder.next_pass_index(), &plan, query.text())
                .await;
            let decision = Decision::evaluate(policy, &pass);

            info!(
                pass = pass.pass_index,
                strategy = %pass.strategy,
                score = pass.score,
                chunks = pass.chunk_count(),
                status = ?decision.status,
                "{}",
                decision.rationale
            );

            recorder.record(pass.clone());

            let Some(strategy) = decision.next_strategy else {
                break decision;
            };

            plan = match strategy {
                Strategy::Reformulated => {
                    if cancel.is_cancelled() {
                        break Decision::cancelled(Some(&pass));
                    }
                    match self.reformulate(query, &recorder).await {
                        Ok(rewritten) => PassPlan {
                            strategy,
                            query: rewritten,
                        },
                        Err(failure) => {
                            warn!(reason = %failure.reason, "No alternative query");
                            break Decision::reformulation_failed(&pass, failure);
                        }
                    }
                }
                Strategy::Filtered | Strategy::Semantic => PassPlan {
                    strategy,
                    query: query.clone(),
                },
            };
        };

        info!(
            status = ?decision.status,
            passes = recorder.passes().len(),
            "Controller finished: {}",
            decision.rationale
        );

        let final_context: Vec<Chunk> = match (&decision.pass, decision.is_success()) {
            (Some(pass), true) => pass.iter_chunks().cloned().collect(),
            _ => Vec::new(),
        };

        let answer = if decision.is_success() {
            self.generate(query.text(), &final_context).await
        } else {
            None
        };

        AnswerOutcome {
            answer,
            final_context,
            trace: recorder.finish(decision.clone()),
            decision,
        }
    }

    /// Retrieve, re-rank, judge and score one pass
    async fn run_pass(&self, pass_index: u32, plan: &PassPlan, question: &str) -> PassResult {
        let (retrieval_text, filter) = match plan.strategy {
            Strategy::Filtered => (plan.query.augmented_text(), plan.query.filter()),
            Strategy::Semantic | Strategy::Reformulated => (plan.query.text().to_string(), None),
        };
        let filters = filter
            .as_ref()
            .map(|filter| filter.describe())
            .unwrap_or_default();

        debug!(
            pass = pass_index,
            strategy = %plan.strategy,
            query = %retrieval_text,
            ?filters,
            "Running pass"
        );

        let ranked = self.reranker.rank(&retrieval_text, question, filter).await;
        let mut degradations = ranked.degradations;
        let semantic_score = ranked.semantic_score;

        let chunks: Vec<&Chunk> = ranked.chunks.iter().map(|s| &s.chunk).collect();
        let (judge_score, judge_rationale) = self
            .judge(question, &chunks, semantic_score, &mut degradations)
            .await;

        PassResult {
            pass_index,
            strategy: plan.strategy,
            query_used: retrieval_text,
            chunks: ranked.chunks,
            score: self.scoring.combine(semantic_score, judge_score),
            semantic_score,
            judge_score,
            judge_rationale,
            filters,
            degradations,
        }
    }

    async fn judge(
        &self,
        question: &str,
        chunks: &[&Chunk],
        semantic_score: f32,
        degradations: &mut Vec<String>,
    ) -> (Option<f32>, String) {
        let Some(judge) = &self.judge else {
            return (None, "no judge configured".to_string());
        };
        if chunks.is_empty() {
            return (None, "no chunks retrieved".to_string());
        }
        if semantic_score < self.scoring.judge_skip_below {
            return (None, "low semantic relevance".to_string());
        }

        match self
            .retry
            .with_timeout("judge", judge.assess(question, chunks))
            .await
        {
            Ok(assessment) => (Some(assessment.score), assessment.rationale),
            Err(e) => {
                warn!(judge = judge.judge_name(), error = %e, "Judge failed, using semantic score only");
                degradations.push(format!("judge failed: {}", e));
                (None, format!("judge unavailable, semantic score only: {}", e))
            }
        }
    }

    /// New query from the weakest pass so far
    async fn reformulate(
        &self,
        query: &Query,
        recorder: &TraceRecorder,
    ) -> Result<Query, ReformulationFailure> {
        let weakest = recorder
            .weakest_pass()
            .ok_or_else(|| ReformulationFailure::new("no completed pass to learn from"))?;
        let used = recorder.used_queries();

        let candidate = match tokio::time::timeout(
            self.retry.call_timeout(),
            self.reformulator.reformulate(query, weakest, &used),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    reformulator = self.reformulator.reformulator_name(),
                    timeout_ms = self.retry.call_timeout().as_millis() as u64,
                    "Reformulation timed out, expanding keywords"
                );
                query.rephrased(keyword_expansion(query.text(), &used)?)
            }
        };

        if !is_acceptable_reformulation(candidate.text(), query.text(), &used) {
            return Err(ReformulationFailure::new(format!(
                "'{}' repeats a query already tried",
                candidate.text()
            )));
        }

        debug!(query = %candidate.text(), "Reformulated query");
        Ok(candidate)
    }

    async fn generate(&self, question: &str, context: &[Chunk]) -> Option<String> {
        let generator = self.generator.as_ref()?;

        match generator.generate(question, context).await {
            Ok(answer) => Some(answer),
            Err(e) => {
                warn!(error = %e, "Answer generation failed");
                None
            }
        }
    }
}

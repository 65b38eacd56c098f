//! Answer endpoint handler

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{AnswerRequest, AnswerResponse, ApiError, ContextChunk, Json};
use crate::domain::{Policy, Query};

/// POST /v1/answer
pub async fn create_answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Response, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty").with_param("query"));
    }

    let policy = match request.policy {
        Some(config) => Policy::try_from(config)?,
        None => state.default_policy,
    };
    let query = Query::new(request.query.trim()).with_hints(request.hints());

    let outcome = state.controller.answer(&query, &policy).await;

    info!(
        query_id = %outcome.trace.query_id(),
        status = ?outcome.decision.status,
        passes = outcome.trace.passes().len(),
        "Answer request completed"
    );

    let response = AnswerResponse {
        answer: outcome.answer.as_deref(),
        status: outcome.decision.status,
        final_context: outcome.final_context.iter().map(ContextChunk::from).collect(),
        trace: &outcome.trace,
    };

    Ok(Json(response).into_response())
}

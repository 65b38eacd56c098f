//! v1 API endpoints

pub mod answer;

use axum::{routing::post, Router};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new().route("/answer", post(answer::create_answer))
}

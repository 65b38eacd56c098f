//! Application state shared by the handlers

use std::sync::Arc;

use crate::domain::Policy;
use crate::infrastructure::controller::DecisionController;
use crate::infrastructure::retrieval::InMemoryRetriever;

/// Controller, default policy and the loaded index
#[derive(Debug, Clone)]
pub struct AppState {
    pub controller: Arc<DecisionController>,
    /// Policy for requests that do not carry their own
    pub default_policy: Policy,
    pub index: Arc<InMemoryRetriever>,
}

impl AppState {
    pub fn new(
        controller: Arc<DecisionController>,
        default_policy: Policy,
        index: Arc<InMemoryRetriever>,
    ) -> Self {
        Self {
            controller,
            default_policy,
            index,
        }
    }
}

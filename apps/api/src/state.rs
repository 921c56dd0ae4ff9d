use std::sync::Arc;

use crate::assessment::evaluator::Evaluator;
use crate::assessment::store::SubmissionStore;
use crate::config::ScoringConfig;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Submission persistence. Default: `PgSubmissionStore`.
    pub store: Arc<dyn SubmissionStore>,
    /// Pluggable evaluator. Default: `LlmEvaluator`.
    pub evaluator: Arc<dyn Evaluator>,
    /// Scoring policy, fixed for the life of the process.
    pub scoring: ScoringConfig,
}

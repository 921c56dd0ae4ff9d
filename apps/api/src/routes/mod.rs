pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assessment::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/assessments/analyze",
            post(handlers::handle_analyze),
        )
        .route(
            "/api/v1/submissions/:id/report",
            get(handlers::handle_get_report),
        )
        .with_state(state)
}

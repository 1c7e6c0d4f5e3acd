pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Scoring and optimization
        .route("/api/optimize", post(handlers::handle_optimize))
        .route("/api/optimize/batch", post(handlers::handle_batch_optimize))
        .route("/api/analyze", post(handlers::handle_analyze))
        .route("/api/preview", post(handlers::handle_preview))
        // Job postings and cover letters
        .route("/api/job/analyze", post(handlers::handle_job_analyze))
        .route("/api/cover-letter", post(handlers::handle_cover_letter))
        .with_state(state)
}

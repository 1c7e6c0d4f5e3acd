mod analysis;
mod config;
mod errors;
mod routes;
mod state;
mod workflow_client;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::ats_scorer::{AtsScorer, ScoringThresholds, ScoringWeights};
use crate::analysis::optimizer::ResumeOptimizer;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::workflow_client::WorkflowExecutor;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values only)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize workflow executor (optional; local heuristics otherwise)
    let workflows = match config.workflow() {
        Some(workflow_config) => {
            info!(
                "Workflow executor enabled: {} (max retries {})",
                workflow_config.base_url, workflow_config.max_retries
            );
            Some(WorkflowExecutor::new(workflow_config)?)
        }
        None => {
            warn!("WORKFLOW_BASE_URL not set, AI-augmented features use local fallbacks");
            None
        }
    };

    let scorer = AtsScorer::new(ScoringWeights::default(), ScoringThresholds::default());
    let optimizer = Arc::new(ResumeOptimizer::new(scorer, workflows));

    // Build app state
    let state = AppState {
        config: config.clone(),
        optimizer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

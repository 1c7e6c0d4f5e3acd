use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;
use crate::workflow_client::WorkflowId;

/// GET /health
/// Returns a simple status object with service version and the workflow
/// catalog the optimizer can call when an executor is configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "ats-api",
        "workflows": state.config.workflow_base_url.is_some(),
        "workflowCatalog": WorkflowId::ALL.map(|w| w.as_str()),
    }))
}

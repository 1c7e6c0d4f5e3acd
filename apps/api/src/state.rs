use std::sync::Arc;

use crate::analysis::optimizer::ResumeOptimizer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Stateless; shared by every request.
    pub optimizer: Arc<ResumeOptimizer>,
}

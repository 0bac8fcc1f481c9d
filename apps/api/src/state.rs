use std::sync::Arc;

use crate::config::Config;
use crate::normalize::Normalizer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Heuristic pipeline, compiled once from the configured tables.
    pub normalizer: Arc<Normalizer>,
}

use std::sync::Arc;

use crate::config::Config;
use crate::generation::pipeline::GenerationPipeline;
use crate::history::PostStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the text backend and the read-only network profile table.
    pub pipeline: GenerationPipeline,
    /// Pluggable history store. Default: RedisPostStore.
    pub store: Arc<dyn PostStore>,
    pub config: Config,
}

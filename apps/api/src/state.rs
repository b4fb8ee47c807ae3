use std::sync::Arc;

use crate::config::Config;
use crate::generation::pipeline::Pipeline;
use crate::observability::MetricsRecorder;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub metrics: Arc<MetricsRecorder>,
    pub config: Config,
}

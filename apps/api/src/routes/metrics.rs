use axum::{extract::State, Json};

use crate::observability::MetricsSnapshot;
use crate::state::AppState;

/// GET /api/metrics
/// Current counters and moving averages of the in-process recorder.
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

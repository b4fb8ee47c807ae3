use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// GET /api/health
/// Returns a simple status object with service name and current time.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

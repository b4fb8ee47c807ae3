pub mod health;
pub mod metrics;

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::generation::handlers;
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Routes plus the HTTP layers. Request flow, outermost first:
/// set request id -> propagate it to the response -> trace span -> CORS.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/metrics", get(metrics::metrics_handler))
        .route("/v1/generate", post(handlers::handle_generate))
        .route("/v1/generate/resume", post(handlers::handle_generate_resume))
        .route(
            "/v1/generate/cover-letter",
            post(handlers::handle_generate_cover_letter),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

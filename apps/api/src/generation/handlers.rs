//! Axum route handlers for the Generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::pipeline::RunContext;
use crate::models::request::GenerateRequest;
use crate::models::resume::{CoverLetterResponse, GenerateResponse, ResumeResponse};
use crate::routes::REQUEST_ID_HEADER;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /v1/generate
///
/// Runs extraction, résumé and cover letter generation.
pub async fn handle_generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let request = accept(payload)?;
    let ctx = run_context(&headers);
    info!(
        "Generating resume and cover letter (language={}, tone={}, request_id={:?})",
        request.language,
        request.tone.as_str(),
        ctx.request_id
    );

    let response = state.pipeline.run(&request, &ctx).await?;
    Ok(Json(response))
}

/// POST /v1/generate/resume
pub async fn handle_generate_resume(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<ResumeResponse>, AppError> {
    let request = accept(payload)?;
    let ctx = run_context(&headers);
    info!(
        "Generating resume (language={}, request_id={:?})",
        request.language, ctx.request_id
    );

    let resume = state.pipeline.run_resume(&request, &ctx).await?;
    Ok(Json(resume))
}

/// POST /v1/generate/cover-letter
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let request = accept(payload)?;
    let ctx = run_context(&headers);
    info!(
        "Generating cover letter (language={}, request_id={:?})",
        request.language, ctx.request_id
    );

    let letter = state.pipeline.run_cover_letter(&request, &ctx).await?;
    Ok(Json(letter))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Rejects malformed bodies and blank texts before any model call.
fn accept(
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<GenerateRequest, AppError> {
    let Json(request) =
        payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(request)
}

/// Uses the id set by the request-id layer; mints one if the header is absent.
fn run_context(headers: &HeaderMap) -> RunContext {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    RunContext::new(request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_run_context_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(run_context(&headers).request_id.as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_run_context_generates_uuid_without_header() {
        let ctx = run_context(&HeaderMap::new());
        assert!(Uuid::parse_str(ctx.request_id.as_deref().unwrap()).is_ok());
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::pipeline::PipelineError;
use crate::generation::Stage;
use crate::llm_client::{LlmCallError, LlmError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Llm(e) => match e.cause() {
                LlmError::MissingApiKey => AppError::Configuration(
                    "OpenAI API key is not configured. Set OPENAI_API_KEY and restart the service."
                        .to_string(),
                ),
                _ => {
                    tracing::error!(
                        "LLM call failed at {} after {} attempt(s): {:?}",
                        e.stage(),
                        e.attempts(),
                        e.cause()
                    );
                    AppError::Provider(provider_message(&e))
                }
            },
            PipelineError::Validation { stage, source } => AppError::InvalidOutput(format!(
                "The AI model returned an invalid {} ({source})",
                record_name(stage)
            )),
            e @ (PipelineError::EmptyOutput { .. }
            | PipelineError::MalformedOutput { .. }
            | PipelineError::Sanitize { .. }) => {
                tracing::error!("Unusable model output: {e}");
                AppError::InvalidOutput(format!(
                    "The AI model returned an unusable {}. Please try again.",
                    e.stage().map(record_name).unwrap_or("response")
                ))
            }
            PipelineError::Timeout(limit) => AppError::Timeout(format!(
                "Generation did not finish within {} seconds",
                limit.as_secs()
            )),
        }
    }
}

fn provider_message(err: &LlmCallError) -> String {
    match err {
        LlmCallError::Exhausted { attempts, .. } => format!(
            "The AI provider is unavailable after {attempts} attempts. Please try again later."
        ),
        LlmCallError::Fatal { .. } => {
            "The AI provider rejected the request. Please try again later.".to_string()
        }
    }
}

fn record_name(stage: Stage) -> &'static str {
    match stage {
        Stage::Extract => "extraction",
        Stage::GenerateResume => "resume",
        Stage::GenerateCoverLetter => "cover letter",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::InvalidOutput(msg) => {
                tracing::warn!("Invalid model output: {msg}");
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }
            AppError::Provider(msg) => {
                tracing::error!("Provider error: {msg}");
                (StatusCode::FAILED_DEPENDENCY, msg.clone())
            }
            AppError::Timeout(msg) => {
                tracing::error!("Request timeout: {msg}");
                (StatusCode::REQUEST_TIMEOUT, msg.clone())
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Rule, ValidationError};
    use std::time::Duration;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_missing_api_key_maps_to_500_with_message() {
        let err = AppError::from(PipelineError::Llm(LlmCallError::Fatal {
            stage: Stage::Extract,
            attempts: 1,
            source: LlmError::MissingApiKey,
        }));
        assert!(matches!(&err, AppError::Configuration(msg) if msg.contains("OPENAI_API_KEY")));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_provider_failures_map_to_424_without_cause() {
        let err = AppError::from(PipelineError::Llm(LlmCallError::Exhausted {
            stage: Stage::GenerateResume,
            attempts: 3,
            source: LlmError::from_status(503, "upstream secret detail".to_string()),
        }));
        assert!(matches!(&err, AppError::Provider(msg) if !msg.contains("secret")));
        assert_eq!(status_of(err), StatusCode::FAILED_DEPENDENCY);
    }

    #[test]
    fn test_output_validation_maps_to_422_with_path() {
        let err = AppError::from(PipelineError::Validation {
            stage: Stage::GenerateResume,
            source: ValidationError::new("experiences[0].end_date", Rule::Required),
        });
        assert!(matches!(
            &err,
            AppError::InvalidOutput(msg) if msg.contains("experiences[0].end_date")
        ));
        assert_eq!(status_of(err), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_timeout_maps_to_408() {
        let err = AppError::from(PipelineError::Timeout(Duration::from_secs(120)));
        assert!(matches!(&err, AppError::Timeout(msg) if msg.contains("120 seconds")));
        assert_eq!(status_of(err), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_request_validation_is_422() {
        assert_eq!(
            status_of(AppError::Validation("job_text: must not be empty".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}

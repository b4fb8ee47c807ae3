//! LLM client: the single point of entry for all provider calls.
//!
//! No other module may call the provider API directly. The pipeline talks to
//! `LlmCaller` (retry, timeout, telemetry), which talks to an `LlmExecutor`
//! (one attempt). `OpenAiClient` is the production executor; tests swap in
//! scripted executors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;
pub mod retry;

pub use retry::{LlmCallError, LlmCaller, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider API key is not configured")]
    MissingApiKey,

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rate limited by provider: {message}")]
    RateLimited { message: String },

    #[error("provider server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("provider rejected credentials (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("provider rejected the request (status {status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("unexpected provider response (status {status}): {message}")]
    Unexpected { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Coarse failure classification used for retry decisions and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureClass {
    Timeout,
    RateLimited,
    Transient,
    Auth,
    BadRequest,
    Configuration,
    /// The attempt was dropped before it finished.
    Cancelled,
    Unknown,
}

impl FailureClass {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureClass::Timeout | FailureClass::RateLimited | FailureClass::Transient
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Timeout => "timeout",
            FailureClass::RateLimited => "rate_limited",
            FailureClass::Transient => "transient",
            FailureClass::Auth => "auth",
            FailureClass::BadRequest => "bad_request",
            FailureClass::Configuration => "configuration",
            FailureClass::Cancelled => "cancelled",
            FailureClass::Unknown => "unknown",
        }
    }
}

impl LlmError {
    /// Maps a non-2xx provider status to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => LlmError::RateLimited { message },
            500..=599 => LlmError::Server { status, message },
            401 | 403 => LlmError::Auth { status, message },
            400 | 404 | 413 | 422 => LlmError::BadRequest { status, message },
            _ => LlmError::Unexpected { status, message },
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            LlmError::MissingApiKey => FailureClass::Configuration,
            LlmError::Timeout(_) => FailureClass::Timeout,
            LlmError::Transport(e) if e.is_timeout() => FailureClass::Timeout,
            LlmError::Transport(e) if e.is_builder() || e.is_redirect() => FailureClass::Unknown,
            LlmError::Transport(_) => FailureClass::Transient,
            LlmError::RateLimited { .. } => FailureClass::RateLimited,
            LlmError::Server { .. } => FailureClass::Transient,
            LlmError::Auth { .. } => FailureClass::Auth,
            LlmError::BadRequest { .. } => FailureClass::BadRequest,
            LlmError::Unexpected { .. } | LlmError::Decode(_) => FailureClass::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class().is_retryable()
    }
}

/// One rendered prompt, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Token accounting as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Raw model output of a single successful attempt.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
    pub model: Option<String>,
}

/// Performs exactly one provider call. Retry, timeout and telemetry live in
/// `LlmCaller`; implementations must not retry on their own.
#[async_trait]
pub trait LlmExecutor: Send + Sync {
    async fn complete(&self, prompt: &PromptPayload) -> Result<LlmResponse, LlmError>;
}

/// Provider connection settings, resolved from `Config`.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// OpenAI Chat Completions executor with JSON-object response format.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiClient {
    pub fn new(config: ProviderConfig) -> Result<Self, LlmError> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LlmExecutor for OpenAiClient {
    async fn complete(&self, prompt: &PromptPayload) -> Result<LlmResponse, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey)?;

        let request_body = ChatRequest {
            model: &self.config.model,
            temperature: prompt.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Try to parse error message
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::from_status(status.as_u16(), message));
        }

        let completion: ChatCompletion = serde_json::from_str(&body)?;

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(LlmResponse {
            content: completion
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content),
            usage: completion.usage,
            model: completion.model,
        })
    }
}

//! Pipeline Orchestrator.
//!
//! Sequences the stages of one request:
//!   1. extract               (always)
//!   2. generate_resume       (skipped by `run_cover_letter`)
//!   3. generate_cover_letter (skipped by `run_resume`)
//!
//! Every stage is render -> call -> parse -> sanitize -> validate; any failure
//! aborts the run. The whole run is bounded by the request timeout, and
//! dropping the returned future cancels whatever call is in flight.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::generation::extraction::{CoverLetterInputs, ExtractedPayload};
use crate::generation::templates::{self, StageTemperatures};
use crate::generation::tone::cover_letter_defaults;
use crate::generation::Stage;
use crate::llm_client::{
    LlmCallError, LlmCaller, LlmExecutor, PromptPayload, RetryPolicy, TokenUsage,
};
use crate::models::request::GenerateRequest;
use crate::models::resume::{CoverLetterResponse, GenerateResponse, ResumeResponse};
use crate::observability::metrics::{
    MetricEvent, MetricsRecorder, PipelineEvent, RecordOnDrop, StageEvent,
};
use crate::validation::hints::{COVER_LETTER_HINTS, RESUME_HINTS};
use crate::validation::sanitizer::{sanitize, sanitize_loose, SanitizeError};
use crate::validation::text::strip_json_fences;
use crate::validation::validator::{validate_cover_letter, validate_resume};
use crate::validation::ValidationError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub temperatures: StageTemperatures,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            temperatures: StageTemperatures::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Llm(#[from] LlmCallError),

    #[error("{stage} returned an empty response")]
    EmptyOutput { stage: Stage },

    #[error("{stage} returned invalid JSON: {source}")]
    MalformedOutput {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage} output could not be sanitized: {source}")]
    Sanitize {
        stage: Stage,
        #[source]
        source: SanitizeError,
    },

    #[error("{stage} output failed validation: {source}")]
    Validation {
        stage: Stage,
        #[source]
        source: ValidationError,
    },

    #[error("generation did not finish within {0:?}")]
    Timeout(Duration),
}

impl PipelineError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Llm(e) => Some(e.stage()),
            PipelineError::EmptyOutput { stage }
            | PipelineError::MalformedOutput { stage, .. }
            | PipelineError::Sanitize { stage, .. }
            | PipelineError::Validation { stage, .. } => Some(*stage),
            PipelineError::Timeout(_) => None,
        }
    }
}

/// Per-request context carried through every stage.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub request_id: Option<String>,
}

impl RunContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }
}

/// Bookkeeping for one run: stage timings and summed token usage.
/// A run dropped before `Pipeline::finish` (client disconnect) is recorded
/// as a failed request on drop.
struct RunState {
    metrics: Arc<MetricsRecorder>,
    request_id: Option<String>,
    started: Instant,
    stage_durations: Vec<(Stage, Duration)>,
    usage: TokenUsage,
    recorded: bool,
}

impl RunState {
    fn new(ctx: &RunContext, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            metrics,
            request_id: ctx.request_id.clone(),
            started: Instant::now(),
            stage_durations: Vec::with_capacity(3),
            usage: TokenUsage::default(),
            recorded: false,
        }
    }

    fn record(&mut self, success: bool) -> Duration {
        let duration = self.started.elapsed();
        self.metrics.record(MetricEvent::Pipeline(PipelineEvent {
            success,
            duration,
            stage_durations: self.stage_durations.clone(),
            usage: self.usage,
            request_id: self.request_id.clone(),
        }));
        self.recorded = true;
        duration
    }
}

impl Drop for RunState {
    fn drop(&mut self) {
        if !self.recorded {
            let duration = self.record(false);
            warn!(
                "Generation cancelled after {}ms (request_id={:?})",
                duration.as_millis(),
                self.request_id
            );
        }
    }
}

pub struct Pipeline {
    caller: LlmCaller,
    metrics: Arc<MetricsRecorder>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        executor: Arc<dyn LlmExecutor>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            caller: LlmCaller::new(executor, config.retry, metrics.clone()),
            metrics,
            config,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Entry points
    // ────────────────────────────────────────────────────────────────────────

    /// Résumé and cover letter.
    pub async fn run(
        &self,
        request: &GenerateRequest,
        ctx: &RunContext,
    ) -> Result<GenerateResponse, PipelineError> {
        let mut state = RunState::new(ctx, self.metrics.clone());
        let result = self.bounded(self.generate_all(request, &mut state)).await;
        self.finish(&mut state, &result);
        result
    }

    /// Résumé only; the cover letter stage is skipped.
    pub async fn run_resume(
        &self,
        request: &GenerateRequest,
        ctx: &RunContext,
    ) -> Result<ResumeResponse, PipelineError> {
        let mut state = RunState::new(ctx, self.metrics.clone());
        let result = self.bounded(self.resume_only(request, &mut state)).await;
        self.finish(&mut state, &result);
        result
    }

    /// Cover letter only; the résumé stage is skipped and the letter is
    /// grounded on the extracted payload directly.
    pub async fn run_cover_letter(
        &self,
        request: &GenerateRequest,
        ctx: &RunContext,
    ) -> Result<CoverLetterResponse, PipelineError> {
        let mut state = RunState::new(ctx, self.metrics.clone());
        let result = self.bounded(self.cover_letter_only(request, &mut state)).await;
        self.finish(&mut state, &result);
        result
    }

    async fn generate_all(
        &self,
        request: &GenerateRequest,
        state: &mut RunState,
    ) -> Result<GenerateResponse, PipelineError> {
        let extracted = self.extract(request, state).await?;
        let resume = self.generate_resume(request, &extracted, state).await?;
        let inputs = CoverLetterInputs::from_resume(&resume);
        let cover_letter = self.generate_cover_letter(request, &inputs, state).await?;
        Ok(GenerateResponse {
            resume,
            cover_letter,
        })
    }

    async fn resume_only(
        &self,
        request: &GenerateRequest,
        state: &mut RunState,
    ) -> Result<ResumeResponse, PipelineError> {
        let extracted = self.extract(request, state).await?;
        self.generate_resume(request, &extracted, state).await
    }

    async fn cover_letter_only(
        &self,
        request: &GenerateRequest,
        state: &mut RunState,
    ) -> Result<CoverLetterResponse, PipelineError> {
        let extracted = self.extract(request, state).await?;
        let inputs = CoverLetterInputs::from_extracted(&extracted);
        self.generate_cover_letter(request, &inputs, state).await
    }

    // ────────────────────────────────────────────────────────────────────────
    // Stages
    // ────────────────────────────────────────────────────────────────────────

    async fn extract(
        &self,
        request: &GenerateRequest,
        state: &mut RunState,
    ) -> Result<ExtractedPayload, PipelineError> {
        let stage = Stage::Extract;
        let prompt = templates::extraction_prompt(request, self.config.temperatures.extract);

        self.run_stage(stage, &prompt, state, |value| {
            sanitize_loose(value)
                .map(ExtractedPayload::new)
                .map_err(|source| PipelineError::Sanitize { stage, source })
        })
        .await
    }

    async fn generate_resume(
        &self,
        request: &GenerateRequest,
        extracted: &ExtractedPayload,
        state: &mut RunState,
    ) -> Result<ResumeResponse, PipelineError> {
        let stage = Stage::GenerateResume;
        let prompt =
            templates::resume_prompt(request, extracted, self.config.temperatures.resume);

        self.run_stage(stage, &prompt, state, |value| {
            let cleaned = sanitize(value, &RESUME_HINTS)
                .map_err(|source| PipelineError::Sanitize { stage, source })?;
            validate_resume(&cleaned).map_err(|source| PipelineError::Validation { stage, source })
        })
        .await
    }

    async fn generate_cover_letter(
        &self,
        request: &GenerateRequest,
        inputs: &CoverLetterInputs,
        state: &mut RunState,
    ) -> Result<CoverLetterResponse, PipelineError> {
        let stage = Stage::GenerateCoverLetter;
        let prompt = templates::cover_letter_prompt(
            request,
            inputs,
            self.config.temperatures.cover_letter,
        );
        let defaults = cover_letter_defaults(request.language, &inputs.candidate_name);

        let letter = self
            .run_stage(stage, &prompt, state, |value| {
                // An all-blank letter sanitizes to nothing; let the validator
                // report the missing body instead.
                let cleaned = match sanitize(value, &COVER_LETTER_HINTS) {
                    Ok(cleaned) => cleaned,
                    Err(SanitizeError::Empty) => Value::Object(Default::default()),
                    Err(source) => return Err(PipelineError::Sanitize { stage, source }),
                };
                validate_cover_letter(&cleaned, &defaults)
                    .map_err(|source| PipelineError::Validation { stage, source })
            })
            .await?;

        if !letter.body_within_target() {
            warn!(
                "Cover letter body has {} words, outside the target range (request_id={:?})",
                letter.body_word_count(),
                state.request_id
            );
        }

        Ok(letter)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Shared plumbing
    // ────────────────────────────────────────────────────────────────────────

    /// Calls the model, hands the parsed JSON to `parse` and records one
    /// stage metric regardless of outcome.
    async fn run_stage<T>(
        &self,
        stage: Stage,
        prompt: &PromptPayload,
        state: &mut RunState,
        parse: impl FnOnce(Value) -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        let started = Instant::now();
        let request_id = state.request_id.clone();
        let in_flight = RecordOnDrop::new(&self.metrics, move || {
            warn!(
                "Stage {stage} cancelled after {}ms (request_id={request_id:?})",
                started.elapsed().as_millis()
            );
            MetricEvent::Stage(StageEvent {
                stage,
                duration: started.elapsed(),
                success: false,
                usage: None,
                request_id,
            })
        });

        let (result, usage) = match self.call_json(stage, prompt, state).await {
            Ok((value, usage)) => (parse(value), usage),
            Err(e) => (Err(e), None),
        };
        in_flight.disarm();

        let duration = started.elapsed();
        state.stage_durations.push((stage, duration));
        if let Some(usage) = &usage {
            state.usage.add(usage);
        }

        self.metrics.record(MetricEvent::Stage(StageEvent {
            stage,
            duration,
            success: result.is_ok(),
            usage,
            request_id: state.request_id.clone(),
        }));

        match &result {
            Ok(_) => info!("Stage {stage} completed in {}ms", duration.as_millis()),
            Err(e) => error!(
                "Stage {stage} failed after {}ms: {e} (request_id={:?})",
                duration.as_millis(),
                state.request_id
            ),
        }

        result
    }

    async fn call_json(
        &self,
        stage: Stage,
        prompt: &PromptPayload,
        state: &RunState,
    ) -> Result<(Value, Option<TokenUsage>), PipelineError> {
        let response = self
            .caller
            .call(stage, prompt, state.request_id.as_deref())
            .await?;
        debug!("{stage} answered by model {:?}", response.model);

        let text = response
            .content
            .as_deref()
            .map(strip_json_fences)
            .filter(|text| !text.is_empty())
            .ok_or(PipelineError::EmptyOutput { stage })?;

        let value = serde_json::from_str(text)
            .map_err(|source| PipelineError::MalformedOutput { stage, source })?;

        Ok((value, response.usage))
    }

    async fn bounded<T>(
        &self,
        work: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        let limit = self.config.request_timeout;
        tokio::time::timeout(limit, work)
            .await
            .unwrap_or(Err(PipelineError::Timeout(limit)))
    }

    fn finish<T>(&self, state: &mut RunState, result: &Result<T, PipelineError>) {
        let duration = state.record(result.is_ok());

        match result {
            Ok(_) => info!(
                "Generation finished in {}ms ({} stages, {} tokens)",
                duration.as_millis(),
                state.stage_durations.len(),
                state.usage.total_tokens
            ),
            Err(e) => warn!(
                "Generation failed after {}ms at {}: {e}",
                duration.as_millis(),
                e.stage().map(|s| s.as_str()).unwrap_or("request timeout")
            ),
        }
    }
}

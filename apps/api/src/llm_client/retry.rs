//! Retrying caller: bounded attempts, per-attempt timeout, exponential backoff
//! and one telemetry event per attempt.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use super::{FailureClass, LlmError, LlmExecutor, LlmResponse, PromptPayload};
use crate::generation::Stage;
use crate::observability::metrics::{AttemptEvent, MetricEvent, MetricsRecorder, RecordOnDrop};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(30),
            min_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `failed_attempt`-th failure (1-based):
    /// `min(min_backoff * 2^(n-1), max_backoff)`.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        self.min_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Error)]
pub enum LlmCallError {
    #[error("{stage} call failed on attempt {attempts} with a non-retryable error: {source}")]
    Fatal {
        stage: Stage,
        attempts: u32,
        #[source]
        source: LlmError,
    },

    #[error("{stage} call failed after {attempts} attempts: {source}")]
    Exhausted {
        stage: Stage,
        attempts: u32,
        #[source]
        source: LlmError,
    },
}

impl LlmCallError {
    pub fn stage(&self) -> Stage {
        match self {
            LlmCallError::Fatal { stage, .. } | LlmCallError::Exhausted { stage, .. } => *stage,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            LlmCallError::Fatal { attempts, .. } | LlmCallError::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    /// The error of the last attempt.
    pub fn cause(&self) -> &LlmError {
        match self {
            LlmCallError::Fatal { source, .. } | LlmCallError::Exhausted { source, .. } => source,
        }
    }
}

/// Wraps an executor with the retry policy and per-attempt telemetry.
#[derive(Clone)]
pub struct LlmCaller {
    executor: Arc<dyn LlmExecutor>,
    policy: RetryPolicy,
    metrics: Arc<MetricsRecorder>,
}

impl LlmCaller {
    pub fn new(
        executor: Arc<dyn LlmExecutor>,
        policy: RetryPolicy,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            executor,
            policy,
            metrics,
        }
    }

    /// Runs `prompt` until it succeeds, fails fatally or runs out of attempts.
    /// Dropping the returned future cancels the in-flight attempt and any
    /// pending backoff sleep.
    pub async fn call(
        &self,
        stage: Stage,
        prompt: &PromptPayload,
        request_id: Option<&str>,
    ) -> Result<LlmResponse, LlmCallError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let started = Instant::now();
            let in_flight = RecordOnDrop::new(&self.metrics, move || {
                MetricEvent::Attempt(AttemptEvent {
                    stage,
                    attempt,
                    latency: started.elapsed(),
                    failure: Some(FailureClass::Cancelled),
                    request_id: request_id.map(str::to_string),
                })
            });

            let outcome = match tokio::time::timeout(
                self.policy.attempt_timeout,
                self.executor.complete(prompt),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(self.policy.attempt_timeout)),
            };
            in_flight.disarm();

            let latency = started.elapsed();
            let failure = outcome.as_ref().err().map(LlmError::class);
            self.record_attempt(stage, attempt, latency, failure, request_id);

            let err = match outcome {
                Ok(response) => {
                    if attempt > 1 {
                        info!("{stage} succeeded on attempt {attempt}/{max_attempts}");
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                warn!("{stage} attempt {attempt} failed with non-retryable error: {err}");
                return Err(LlmCallError::Fatal {
                    stage,
                    attempts: attempt,
                    source: err,
                });
            }

            if attempt >= max_attempts {
                warn!("{stage} giving up after {attempt} attempts: {err}");
                return Err(LlmCallError::Exhausted {
                    stage,
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.policy.backoff(attempt);
            warn!(
                "{stage} attempt {attempt}/{max_attempts} failed ({}): {err}. Retrying in {}ms",
                err.class().as_str(),
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn record_attempt(
        &self,
        stage: Stage,
        attempt: u32,
        latency: Duration,
        failure: Option<FailureClass>,
        request_id: Option<&str>,
    ) {
        self.metrics.record(MetricEvent::Attempt(AttemptEvent {
            stage,
            attempt,
            latency,
            failure,
            request_id: request_id.map(str::to_string),
        }));
    }
}

//! Metrics Recorder.
//!
//! One long-lived `Arc<MetricsRecorder>` is created at startup with
//! [`MetricsRecorder::init`] and shared by every request. `record` never fails
//! and holds the lock only long enough to bump counters. Each event is also
//! emitted as a structured `tracing` event under the `metrics` target.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::generation::Stage;
use crate::llm_client::{FailureClass, TokenUsage};

/// Smoothing factor for latency moving averages.
pub const LATENCY_EMA_ALPHA: f64 = 0.2;

const METRICS_TARGET: &str = "metrics";

// ────────────────────────────────────────────────────────────────────────────
// Events
// ────────────────────────────────────────────────────────────────────────────

/// One provider attempt, successful or not.
#[derive(Debug, Clone)]
pub struct AttemptEvent {
    pub stage: Stage,
    pub attempt: u32,
    pub latency: Duration,
    pub failure: Option<FailureClass>,
    pub request_id: Option<String>,
}

/// One completed pipeline stage (all attempts plus parsing and validation).
#[derive(Debug, Clone)]
pub struct StageEvent {
    pub stage: Stage,
    pub duration: Duration,
    pub success: bool,
    pub usage: Option<TokenUsage>,
    pub request_id: Option<String>,
}

/// One finished pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineEvent {
    pub success: bool,
    pub duration: Duration,
    pub stage_durations: Vec<(Stage, Duration)>,
    pub usage: TokenUsage,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum MetricEvent {
    Attempt(AttemptEvent),
    Stage(StageEvent),
    Pipeline(PipelineEvent),
}

/// Records the event built by `event` when dropped, unless [`disarm`] was
/// called first. Work that is cut short by the request timeout or a client
/// disconnect still leaves a failure record behind.
///
/// [`disarm`]: RecordOnDrop::disarm
pub struct RecordOnDrop<'a, F>
where
    F: FnOnce() -> MetricEvent,
{
    metrics: &'a MetricsRecorder,
    event: Option<F>,
}

impl<'a, F> RecordOnDrop<'a, F>
where
    F: FnOnce() -> MetricEvent,
{
    pub fn new(metrics: &'a MetricsRecorder, event: F) -> Self {
        Self {
            metrics,
            event: Some(event),
        }
    }

    /// The guarded work finished and recorded its own outcome.
    pub fn disarm(mut self) {
        self.event = None;
    }
}

impl<F> Drop for RecordOnDrop<'_, F>
where
    F: FnOnce() -> MetricEvent,
{
    fn drop(&mut self) {
        if let Some(event) = self.event.take() {
            self.metrics.record(event());
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Snapshot
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub success: u64,
    pub error: u64,
}

impl OutcomeCounts {
    fn bump(&mut self, success: bool) {
        if success {
            self.success += 1;
        } else {
            self.error += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageStats {
    /// Stage outcomes.
    #[serde(flatten)]
    pub outcomes: OutcomeCounts,
    pub attempts: OutcomeCounts,
    /// Failed attempts by failure class.
    pub failures: BTreeMap<String, u64>,
    pub latency_ms_ema: Option<f64>,
    pub attempt_latency_ms_ema: Option<f64>,
    pub tokens: TokenUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: OutcomeCounts,
    pub request_latency_ms_ema: Option<f64>,
    pub tokens: TokenUsage,
    pub stages: BTreeMap<String, StageStats>,
}

// ────────────────────────────────────────────────────────────────────────────
// Recorder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MetricsRecorder {
    state: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the process-wide recorder.
    pub fn init() -> Arc<Self> {
        info!(target: METRICS_TARGET, "Metrics recorder initialized");
        Arc::new(Self::new())
    }

    pub fn record(&self, event: MetricEvent) {
        emit(&event);

        let mut state = self.lock();
        match event {
            MetricEvent::Attempt(e) => {
                let stats = stage_entry(&mut state, e.stage);
                stats.attempts.bump(e.failure.is_none());
                if let Some(class) = e.failure {
                    *stats.failures.entry(class.as_str().to_string()).or_default() += 1;
                }
                update_ema(&mut stats.attempt_latency_ms_ema, millis(e.latency));
            }
            MetricEvent::Stage(e) => {
                let stats = stage_entry(&mut state, e.stage);
                stats.outcomes.bump(e.success);
                update_ema(&mut stats.latency_ms_ema, millis(e.duration));
                if let Some(usage) = &e.usage {
                    stats.tokens.add(usage);
                }
            }
            MetricEvent::Pipeline(e) => {
                state.requests.bump(e.success);
                update_ema(&mut state.request_latency_ms_ema, millis(e.duration));
                state.tokens.add(&e.usage);
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    pub fn reset(&self) {
        *self.lock() = MetricsSnapshot::default();
    }

    /// A panic while holding the lock cannot leave counters half-updated in a
    /// way that matters, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn stage_entry(state: &mut MetricsSnapshot, stage: Stage) -> &mut StageStats {
    state.stages.entry(stage.as_str().to_string()).or_default()
}

/// Seeds with the first sample, then `alpha * sample + (1 - alpha) * previous`.
fn update_ema(current: &mut Option<f64>, sample: f64) {
    *current = Some(match *current {
        None => sample,
        Some(previous) => LATENCY_EMA_ALPHA * sample + (1.0 - LATENCY_EMA_ALPHA) * previous,
    });
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn emit(event: &MetricEvent) {
    match event {
        MetricEvent::Attempt(e) => info!(
            target: METRICS_TARGET,
            event = "llm_attempt",
            stage = %e.stage,
            attempt = e.attempt,
            latency_ms = millis(e.latency),
            success = e.failure.is_none(),
            failure = e.failure.map(|c| c.as_str()),
            request_id = e.request_id.as_deref(),
        ),
        MetricEvent::Stage(e) => info!(
            target: METRICS_TARGET,
            event = "stage",
            stage = %e.stage,
            duration_ms = millis(e.duration),
            success = e.success,
            total_tokens = e.usage.map(|u| u.total_tokens),
            request_id = e.request_id.as_deref(),
        ),
        MetricEvent::Pipeline(e) => {
            let stages = e
                .stage_durations
                .iter()
                .map(|(stage, d)| format!("{stage}={:.1}ms", millis(*d)))
                .collect::<Vec<_>>()
                .join(",");
            info!(
                target: METRICS_TARGET,
                event = "pipeline",
                success = e.success,
                duration_ms = millis(e.duration),
                stages = %stages,
                prompt_tokens = e.usage.prompt_tokens,
                completion_tokens = e.usage.completion_tokens,
                total_tokens = e.usage.total_tokens,
                request_id = e.request_id.as_deref(),
            )
        }
    }
}

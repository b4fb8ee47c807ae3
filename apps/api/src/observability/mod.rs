// In-process metrics for the generation pipeline.
// Counters and moving averages only; nothing is persisted or exported.

pub mod metrics;

pub use metrics::{MetricsRecorder, MetricsSnapshot};

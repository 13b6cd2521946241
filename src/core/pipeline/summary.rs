//! Batch run summary and reporting

use super::handler::HandlerOutcome;
use crate::domain::{FailureKind, ObjectKey, PipelineError};
use std::time::Duration;

/// A failed object within a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub key: ObjectKey,
    pub kind: FailureKind,
    pub message: String,
}

impl RunFailure {
    pub fn new(key: ObjectKey, error: &PipelineError) -> Self {
        Self {
            key,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Summary of a batch of invocations
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of objects handled
    pub processed: usize,

    /// Number written (or validated, in dry-run mode)
    pub succeeded: usize,

    pub failed: usize,

    pub duration: Duration,

    pub outcomes: Vec<HandlerOutcome>,

    pub failures: Vec<RunFailure>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn record_success(&mut self, outcome: HandlerOutcome) {
        self.processed += 1;
        self.succeeded += 1;
        self.outcomes.push(outcome);
    }

    pub fn record_failure(&mut self, key: ObjectKey, error: &PipelineError) {
        self.processed += 1;
        self.failed += 1;
        self.failures.push(RunFailure::new(key, error));
    }

    /// True when no object failed
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }

    /// Success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.processed as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            processed = self.processed,
            succeeded = self.succeeded,
            failed = self.failed,
            duration_ms = self.duration.as_millis() as u64,
            success_rate = format!("{:.2}%", self.success_rate()),
            "Run completed"
        );

        for failure in &self.failures {
            tracing::warn!(
                object_key = %failure.key,
                error_kind = %failure.kind,
                message = %failure.message,
                "Object failed"
            );
        }
    }
}

//! Failure reporting
//!
//! The handler calls [`AlertSink::report`] once per failed invocation. What
//! happens next (counting, windowing, paging someone) is the sink's concern.
//!
//! - [`log_sink`] - structured error log, the default
//! - [`webhook`] - HTTP POST of the report
//! - [`windowed`] - rolling-window threshold in front of another sink

pub mod log_sink;
pub mod webhook;
pub mod windowed;

pub use log_sink::TracingAlertSink;
pub use webhook::WebhookAlertSink;
pub use windowed::{AlertPolicy, WindowedAlertSink};

use crate::domain::{FailureKind, InvocationId, ObjectKey, PipelineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything an operator needs to triage one failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub object_key: String,
    pub message: String,
    pub invocation_id: InvocationId,
    pub occurred_at: DateTime<Utc>,
}

impl FailureReport {
    pub fn new(
        kind: FailureKind,
        object_key: impl Into<String>,
        message: impl Into<String>,
        invocation_id: InvocationId,
    ) -> Self {
        Self {
            kind,
            object_key: object_key.into(),
            message: message.into(),
            invocation_id,
            occurred_at: Utc::now(),
        }
    }

    /// Build a report from a pipeline failure
    pub fn from_error(err: &PipelineError, key: &ObjectKey, invocation_id: InvocationId) -> Self {
        Self::new(err.kind(), key.as_str(), err.to_string(), invocation_id)
    }
}

/// Receiver of failure reports
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Record one failure
    ///
    /// # Errors
    ///
    /// Returns an error if the report could not be delivered. Callers log
    /// this and carry on; it never changes the invocation outcome.
    async fn report(&self, report: &FailureReport) -> Result<()>;
}

/// Forwards every report to each inner sink in turn
///
/// All sinks are attempted; the first error is returned afterwards.
pub struct FanoutAlertSink {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl FanoutAlertSink {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl AlertSink for FanoutAlertSink {
    async fn report(&self, report: &FailureReport) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.report(report).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

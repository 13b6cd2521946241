//! Log-based alert sink

use super::{AlertSink, FailureReport};
use crate::domain::Result;
use async_trait::async_trait;

/// Log target that a log-based metric filter can count
pub const ALERT_TARGET: &str = "hl7stage::alert";

/// Emits one `error!` event per failure on [`ALERT_TARGET`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn report(&self, report: &FailureReport) -> Result<()> {
        tracing::error!(
            target: ALERT_TARGET,
            error_kind = %report.kind,
            object_key = %report.object_key,
            invocation_id = %report.invocation_id,
            occurred_at = %report.occurred_at.to_rfc3339(),
            transient = report.kind.is_transient(),
            message = %report.message,
            "HL7 transformation failed"
        );
        Ok(())
    }
}

//! Per-object pipeline handler
//!
//! One call to [`PipelineHandler::handle`] fetches an inbound object, parses
//! and projects it, and writes the JSON document to the outbound store. The
//! handler holds no per-invocation state, so concurrent calls are
//! independent.

use super::keys::derive_outbound_key;
use super::state::{HandlerState, InvocationState};
use crate::adapters::alert::{AlertSink, FailureReport};
use crate::adapters::factory;
use crate::adapters::storage::{BlobStore, JSON_CONTENT_TYPE};
use crate::config::StageConfig;
use crate::core::transform::{digest_bytes, project};
use crate::domain::{BucketName, InvocationId, ObjectKey, PipelineError, Result};
use crate::hl7::Hl7Parser;
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// Reference to one inbound object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundObject {
    /// Bucket named by the notification, if any
    pub bucket: Option<BucketName>,
    pub key: ObjectKey,
}

impl InboundObject {
    pub fn new(key: ObjectKey) -> Self {
        Self { bucket: None, key }
    }

    pub fn with_bucket(mut self, bucket: BucketName) -> Self {
        self.bucket = Some(bucket);
        self
    }
}

/// Handler behaviour switches
#[derive(Debug, Clone, Default)]
pub struct HandlerSettings {
    pub parser: Hl7Parser,

    /// Wall-clock budget for one invocation; `None` means unbounded
    pub timeout: Option<Duration>,

    /// Prepended to every derived outbound key
    pub outbound_prefix: Option<String>,

    /// Remove the raw object once its JSON is written
    pub delete_inbound_on_success: bool,

    /// Parse and project but write nothing
    pub dry_run: bool,
}

impl HandlerSettings {
    /// Settings taken from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured delimiter defaults are unusable.
    pub fn from_config(config: &StageConfig) -> Result<Self> {
        Ok(Self {
            parser: Hl7Parser::with_defaults(config.parser.delimiters()?),
            timeout: config.pipeline.timeout(),
            outbound_prefix: config.outbound.key_prefix.clone(),
            delete_inbound_on_success: config.pipeline.delete_inbound_on_success,
            dry_run: config.application.dry_run,
        })
    }
}

/// Result of a successful invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutcome {
    pub invocation_id: InvocationId,
    pub inbound_key: ObjectKey,
    pub outbound_key: ObjectKey,
    pub control_id: Option<String>,
    pub message_type: Option<String>,
    /// SHA-256 of the document bytes
    pub digest: String,
    pub segment_count: usize,
    pub bytes: usize,
    /// False in dry-run mode
    pub written: bool,
    pub duration: Duration,
}

/// Single invocation deadline
#[derive(Debug, Clone, Copy)]
struct Deadline {
    limit: Option<(Instant, Duration)>,
}

impl Deadline {
    fn start(budget: Option<Duration>) -> Self {
        Self {
            limit: budget.map(|budget| (Instant::now() + budget, budget)),
        }
    }

    /// Run an I/O step, aborting it when the deadline passes
    async fn run<T, F>(&self, state: HandlerState, step: F) -> std::result::Result<T, PipelineError>
    where
        F: Future<Output = std::result::Result<T, PipelineError>>,
    {
        match self.limit {
            Some((at, budget)) => tokio::time::timeout_at(at, step)
                .await
                .map_err(|_| PipelineError::Timeout { state, budget })?,
            None => step.await,
        }
    }

    /// Fail if the deadline has already passed
    fn check(&self, state: HandlerState) -> std::result::Result<(), PipelineError> {
        match self.limit {
            Some((at, budget)) if Instant::now() >= at => {
                Err(PipelineError::Timeout { state, budget })
            }
            _ => Ok(()),
        }
    }
}

/// Fetch, parse, project and write one object
pub struct PipelineHandler {
    inbound: Arc<dyn BlobStore>,
    outbound: Arc<dyn BlobStore>,
    alerts: Arc<dyn AlertSink>,
    settings: HandlerSettings,
}

impl PipelineHandler {
    pub fn new(
        inbound: Arc<dyn BlobStore>,
        outbound: Arc<dyn BlobStore>,
        alerts: Arc<dyn AlertSink>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            inbound,
            outbound,
            alerts,
            settings,
        }
    }

    /// Build stores, alert sink and settings from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a store or the alert sink cannot be created.
    pub async fn from_config(config: &StageConfig) -> Result<Self> {
        let (inbound, outbound) = factory::create_stores(config).await?;
        let alerts = factory::create_alert_sink(&config.alerting)?;
        let settings = HandlerSettings::from_config(config)?;

        tracing::info!(
            inbound = inbound.location(),
            outbound = outbound.location(),
            dry_run = settings.dry_run,
            "Pipeline handler ready"
        );

        Ok(Self::new(inbound, outbound, alerts, settings))
    }

    pub fn settings(&self) -> &HandlerSettings {
        &self.settings
    }

    /// Process one inbound object
    ///
    /// A failure is reported to the alert sink exactly once before it is
    /// returned. Re-running the same object overwrites the same outbound key
    /// with identical bytes.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] that ended the invocation.
    pub async fn handle(
        &self,
        object: &InboundObject,
    ) -> std::result::Result<HandlerOutcome, PipelineError> {
        let invocation_id = InvocationId::generate();
        let span = tracing::info_span!(
            "invocation",
            invocation_id = %invocation_id,
            object_key = %object.key,
        );

        async move {
            let started = Instant::now();
            let mut state = InvocationState::new(invocation_id);

            match self.run(object, &mut state, started).await {
                Ok(outcome) => {
                    tracing::info!(
                        outbound_key = %outcome.outbound_key,
                        control_id = outcome.control_id.as_deref().unwrap_or(""),
                        digest = %outcome.digest,
                        segment_count = outcome.segment_count,
                        written = outcome.written,
                        duration_ms = outcome.duration.as_millis() as u64,
                        "Message staged"
                    );
                    Ok(outcome)
                }
                Err(err) => {
                    let failed_in = state.fail();
                    tracing::error!(
                        error_kind = %err.kind(),
                        state = %failed_in,
                        error = %err,
                        "Invocation failed"
                    );

                    let report = FailureReport::from_error(&err, &object.key, invocation_id);
                    if let Err(alert_err) = self.alerts.report(&report).await {
                        tracing::warn!(error = %alert_err, "Alert sink rejected failure report");
                    }
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        object: &InboundObject,
        state: &mut InvocationState,
        started: Instant,
    ) -> std::result::Result<HandlerOutcome, PipelineError> {
        let deadline = Deadline::start(self.settings.timeout);

        state.advance(HandlerState::Fetching);
        self.check_bucket(object)?;
        let outbound_key = derive_outbound_key(&object.key, self.settings.outbound_prefix.as_deref())?;

        let raw = deadline
            .run(HandlerState::Fetching, async {
                self.inbound
                    .get(&object.key)
                    .await
                    .map_err(|e| PipelineError::Fetch(e.to_string()))
            })
            .await?;
        tracing::debug!(bytes = raw.len(), "Fetched inbound object");

        state.advance(HandlerState::Parsing);
        let message = self.settings.parser.parse(&raw)?;
        deadline.check(HandlerState::Parsing)?;

        state.advance(HandlerState::Projecting);
        let document = project(&message);
        let body = document
            .to_canonical_bytes()
            .map_err(|e| PipelineError::Write(format!("failed to serialize document: {e}")))?;
        let digest = digest_bytes(&body);
        deadline.check(HandlerState::Projecting)?;

        let mut outcome = HandlerOutcome {
            invocation_id: *state.id(),
            inbound_key: object.key.clone(),
            outbound_key,
            control_id: message.header.control_id.clone(),
            message_type: message.header.message_code(&message.delimiters),
            digest,
            segment_count: message.segments.len(),
            bytes: body.len(),
            written: false,
            duration: Duration::ZERO,
        };

        if self.settings.dry_run {
            tracing::info!(
                outbound_key = %outcome.outbound_key,
                digest = %outcome.digest,
                "Dry run: skipping write"
            );
            state.advance(HandlerState::Done);
            outcome.duration = started.elapsed();
            return Ok(outcome);
        }

        state.advance(HandlerState::Writing);
        deadline.check(HandlerState::Writing)?;
        deadline
            .run(HandlerState::Writing, async {
                self.outbound
                    .put(&outcome.outbound_key, Bytes::from(body), JSON_CONTENT_TYPE)
                    .await
                    .map_err(|e| PipelineError::Write(e.to_string()))
            })
            .await?;
        outcome.written = true;

        if self.settings.delete_inbound_on_success {
            // The document is already staged, so neither a failed nor a timed
            // out delete fails the invocation
            let deleted = deadline
                .run(HandlerState::Writing, async {
                    Ok(self.inbound.delete(&object.key).await)
                })
                .await;
            match deleted {
                Ok(Ok(())) => tracing::debug!("Deleted inbound object"),
                Ok(Err(e)) => tracing::warn!(error = %e, "Failed to delete inbound object"),
                Err(e) => tracing::warn!(error = %e, "Inbound delete abandoned at deadline"),
            }
        }

        state.advance(HandlerState::Done);
        outcome.duration = started.elapsed();
        Ok(outcome)
    }

    fn check_bucket(&self, object: &InboundObject) -> std::result::Result<(), PipelineError> {
        match (&object.bucket, self.inbound.bucket()) {
            (Some(requested), Some(configured)) if requested != configured => {
                Err(PipelineError::Fetch(format!(
                    "notification names bucket '{requested}' but the inbound store is '{configured}'"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::ObjectStoreBackend;
    use crate::adapters::alert::TracingAlertSink;
    use crate::domain::FailureKind;

    const ADT: &[u8] =
        b"MSH|^~\\&|APP|FAC|||20230101||ADT^A01|MSG001|P|2.3\rPID|1||12345^^^MRN||Doe^John";

    fn key(raw: &str) -> ObjectKey {
        ObjectKey::new(raw).unwrap()
    }

    fn handler(settings: HandlerSettings) -> (PipelineHandler, Arc<ObjectStoreBackend>, Arc<ObjectStoreBackend>) {
        let inbound = Arc::new(ObjectStoreBackend::in_memory());
        let outbound = Arc::new(ObjectStoreBackend::in_memory());
        let handler = PipelineHandler::new(
            inbound.clone(),
            outbound.clone(),
            Arc::new(TracingAlertSink),
            settings,
        );
        (handler, inbound, outbound)
    }

    #[tokio::test]
    async fn test_handle_writes_document() {
        let (handler, inbound, outbound) = handler(HandlerSettings::default());
        inbound
            .put(&key("in/adt.hl7"), Bytes::from_static(ADT), "text/plain")
            .await
            .unwrap();

        let outcome = handler
            .handle(&InboundObject::new(key("in/adt.hl7")))
            .await
            .unwrap();

        assert_eq!(outcome.outbound_key.as_str(), "in/adt.json");
        assert_eq!(outcome.control_id.as_deref(), Some("MSG001"));
        assert_eq!(outcome.message_type.as_deref(), Some("ADT^A01"));
        assert_eq!(outcome.segment_count, 2);
        assert!(outcome.written);

        let written = outbound.get(&outcome.outbound_key).await.unwrap();
        assert_eq!(digest_bytes(&written), outcome.digest);
        assert_eq!(written.len(), outcome.bytes);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let (handler, inbound, outbound) = handler(HandlerSettings {
            dry_run: true,
            ..HandlerSettings::default()
        });
        inbound
            .put(&key("adt.hl7"), Bytes::from_static(ADT), "text/plain")
            .await
            .unwrap();

        let outcome = handler.handle(&InboundObject::new(key("adt.hl7"))).await.unwrap();

        assert!(!outcome.written);
        assert!(outbound.get(&key("adt.json")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_inbound_on_success() {
        let (handler, inbound, _outbound) = handler(HandlerSettings {
            delete_inbound_on_success: true,
            ..HandlerSettings::default()
        });
        inbound
            .put(&key("adt.hl7"), Bytes::from_static(ADT), "text/plain")
            .await
            .unwrap();

        handler.handle(&InboundObject::new(key("adt.hl7"))).await.unwrap();
        assert!(inbound.get(&key("adt.hl7")).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_object_is_fetch_error() {
        let (handler, _inbound, _outbound) = handler(HandlerSettings::default());
        let err = handler
            .handle(&InboundObject::new(key("missing.hl7")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Fetch);
    }

    #[tokio::test]
    async fn test_directory_key_is_fetch_error() {
        let (handler, _inbound, _outbound) = handler(HandlerSettings::default());
        let err = handler.handle(&InboundObject::new(key("in/"))).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Fetch);
    }

    #[tokio::test]
    async fn test_deadline_check_after_expiry() {
        let deadline = Deadline::start(Some(Duration::ZERO));
        let err = deadline.check(HandlerState::Parsing).unwrap_err();
        assert_eq!(
            err,
            PipelineError::Timeout {
                state: HandlerState::Parsing,
                budget: Duration::ZERO
            }
        );
        assert!(Deadline::start(None).check(HandlerState::Parsing).is_ok());
    }
}

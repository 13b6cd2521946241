//! Store and alert sink factory
//!
//! Builds the trait objects the pipeline handler depends on from
//! configuration.

use crate::adapters::alert::{
    AlertSink, FanoutAlertSink, TracingAlertSink, WebhookAlertSink, WindowedAlertSink,
};
use crate::adapters::storage::{BlobStore, ObjectStoreBackend};
use crate::config::schema::{AlertingConfig, StageConfig};
use crate::domain::Result;
use std::sync::Arc;

/// Create the inbound and outbound stores
///
/// When both sides name the same URL a single store is shared, so a
/// `memory://` setup sees its own writes.
///
/// # Errors
///
/// Returns an error if either URL cannot be turned into a store
pub async fn create_stores(
    config: &StageConfig,
) -> Result<(Arc<dyn BlobStore>, Arc<dyn BlobStore>)> {
    tracing::info!(url = %config.inbound.url, "Creating inbound store");
    let inbound: Arc<dyn BlobStore> =
        Arc::new(ObjectStoreBackend::from_url(&config.inbound.url).await?);

    if config.outbound.url == config.inbound.url {
        return Ok((inbound.clone(), inbound));
    }

    tracing::info!(url = %config.outbound.url, "Creating outbound store");
    let outbound: Arc<dyn BlobStore> =
        Arc::new(ObjectStoreBackend::from_url(&config.outbound.url).await?);

    Ok((inbound, outbound))
}

/// Create the alert sink
///
/// Failures are always logged. With a webhook configured they are also
/// forwarded through the rolling-window threshold.
///
/// # Errors
///
/// Returns an error if the webhook client cannot be created
pub fn create_alert_sink(config: &AlertingConfig) -> Result<Arc<dyn AlertSink>> {
    let Some(url) = config.webhook_url.clone() else {
        return Ok(Arc::new(TracingAlertSink));
    };

    let policy = config.policy();
    tracing::info!(
        window_seconds = policy.window.as_secs(),
        threshold = policy.threshold,
        "Webhook alerting enabled"
    );
    let webhook = WindowedAlertSink::new(WebhookAlertSink::new(url)?, policy);

    Ok(Arc::new(FanoutAlertSink::new(vec![
        Arc::new(TracingAlertSink) as Arc<dyn AlertSink>,
        Arc::new(webhook) as Arc<dyn AlertSink>,
    ])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::ObjectKey;
    use bytes::Bytes;

    fn memory_config() -> StageConfig {
        let mut config = StageConfig::default();
        config.inbound.url = "memory://".to_string();
        config.outbound.url = "memory://".to_string();
        config
    }

    #[tokio::test]
    async fn test_same_url_shares_store() {
        let (inbound, outbound) = create_stores(&memory_config()).await.unwrap();
        let key = ObjectKey::new("a.json").unwrap();
        outbound
            .put(&key, Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();
        assert_eq!(inbound.get(&key).await.unwrap(), Bytes::from_static(b"{}"));
    }

    #[tokio::test]
    async fn test_distinct_urls_build_two_stores() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = memory_config();
        config.outbound.url = format!("file://{}", dir.path().display());

        let (inbound, outbound) = create_stores(&config).await.unwrap();
        assert_eq!(inbound.location(), "memory://");
        assert_ne!(outbound.location(), inbound.location());
    }

    #[tokio::test]
    async fn test_bad_url_is_error() {
        let mut config = memory_config();
        config.inbound.url = "gopher://x".to_string();
        assert!(create_stores(&config).await.is_err());
    }

    #[test]
    fn test_alert_sink_without_webhook() {
        assert!(create_alert_sink(&AlertingConfig::default()).is_ok());
    }

    #[test]
    fn test_alert_sink_with_webhook() {
        let config = AlertingConfig {
            webhook_url: Some(secret_string("https://hooks.example.com/x".to_string())),
            ..AlertingConfig::default()
        };
        assert!(create_alert_sink(&config).is_ok());

        let bad = AlertingConfig {
            webhook_url: Some(secret_string("::".to_string())),
            ..AlertingConfig::default()
        };
        assert!(create_alert_sink(&bad).is_err());
    }
}

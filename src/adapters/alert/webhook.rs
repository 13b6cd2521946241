//! HTTP webhook alert sink
//!
//! POSTs the JSON [`FailureReport`] to a configured endpoint, such as a
//! pub/sub push topic or a chat webhook.

use super::{AlertSink, FailureReport};
use crate::config::SecretString;
use crate::domain::{Result, StageError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends each report as a JSON POST
pub struct WebhookAlertSink {
    client: Client,
    // The URL usually embeds a token
    url: SecretString,
}

impl WebhookAlertSink {
    /// Create a sink for the given endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or the HTTP client cannot
    /// be built.
    pub fn new(endpoint: SecretString) -> Result<Self> {
        let raw: &str = endpoint.expose_secret().as_ref();
        url::Url::parse(raw).map_err(|e| {
            StageError::Configuration(format!("alerting.webhook_url is not a valid URL: {e}"))
        })?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StageError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: endpoint,
        })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn report(&self, report: &FailureReport) -> Result<()> {
        let url: &str = self.url.expose_secret().as_ref();
        let response = self
            .client
            .post(url)
            .json(report)
            .send()
            .await
            .map_err(|e| StageError::Alert(format!("webhook request failed: {}", e.without_url())))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                status = %status,
                object_key = %report.object_key,
                "Failure report delivered to webhook"
            );
            Ok(())
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(StageError::Alert(format!(
                "webhook returned status {status}: {body}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::{FailureKind, InvocationId};

    #[test]
    fn test_invalid_url_rejected() {
        let result = WebhookAlertSink::new(secret_string("not a url".to_string()));
        assert!(matches!(result, Err(StageError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_posts_report_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hooks/alerts")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"kind":"FetchError","object_key":"raw/a.hl7"}"#.to_string(),
            ))
            .with_status(204)
            .create_async()
            .await;

        let sink =
            WebhookAlertSink::new(secret_string(format!("{}/hooks/alerts", server.url()))).unwrap();
        let report = FailureReport::new(FailureKind::Fetch, "raw/a.hl7", "gone", InvocationId::generate());

        sink.report(&report).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_alert_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(503)
            .with_body("try later")
            .create_async()
            .await;

        let sink = WebhookAlertSink::new(secret_string(server.url())).unwrap();
        let report = FailureReport::new(FailureKind::Write, "a.hl7", "denied", InvocationId::generate());

        let err = sink.report(&report).await.unwrap_err();
        assert!(matches!(err, StageError::Alert(_)));
        assert!(err.to_string().contains("503"));
    }
}

//! Integration tests for failure alerting through the handler

use hl7stage::adapters::alert::{AlertPolicy, WebhookAlertSink, WindowedAlertSink};
use hl7stage::adapters::factory::create_alert_sink;
use hl7stage::adapters::storage::ObjectStoreBackend;
use hl7stage::config::{secret_string, AlertingConfig};
use hl7stage::core::pipeline::{HandlerSettings, InboundObject, PipelineHandler};
use hl7stage::domain::{FailureKind, ObjectKey};
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

fn object(raw: &str) -> InboundObject {
    InboundObject::new(ObjectKey::new(raw).unwrap())
}

#[tokio::test]
async fn test_webhook_notified_once_threshold_is_exceeded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/alerts")
        .match_body(Matcher::PartialJsonString(
            r#"{"kind":"FetchError","object_key":"second.hl7"}"#.to_string(),
        ))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let webhook = WebhookAlertSink::new(secret_string(format!("{}/alerts", server.url()))).unwrap();
    let alerts = WindowedAlertSink::new(
        webhook,
        AlertPolicy {
            window: Duration::from_secs(300),
            threshold: 1,
        },
    );
    let handler = PipelineHandler::new(
        Arc::new(ObjectStoreBackend::in_memory()),
        Arc::new(ObjectStoreBackend::in_memory()),
        Arc::new(alerts),
        HandlerSettings::default(),
    );

    for raw in ["first.hl7", "second.hl7", "third.hl7"] {
        let err = handler.handle(&object(raw)).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Fetch);
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_outage_does_not_mask_failure() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let config = AlertingConfig {
        webhook_url: Some(secret_string(server.url())),
        ..AlertingConfig::default()
    };
    let handler = PipelineHandler::new(
        Arc::new(ObjectStoreBackend::in_memory()),
        Arc::new(ObjectStoreBackend::in_memory()),
        create_alert_sink(&config).unwrap(),
        HandlerSettings::default(),
    );

    let err = handler.handle(&object("raw/a.hl7")).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Fetch);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_report_payload_fields() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("content-type", "application/json")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""kind":"MalformedMessageError""#.to_string()),
            Matcher::Regex(r#""object_key":"in/bad.hl7""#.to_string()),
            Matcher::Regex(r#""invocation_id":"[0-9a-f-]{36}""#.to_string()),
            Matcher::Regex(r#""occurred_at":""#.to_string()),
            Matcher::Regex(r#""message":"malformed HL7 message"#.to_string()),
        ]))
        .with_status(204)
        .create_async()
        .await;

    let inbound = Arc::new(ObjectStoreBackend::in_memory());
    hl7stage::adapters::storage::BlobStore::put(
        inbound.as_ref(),
        &ObjectKey::new("in/bad.hl7").unwrap(),
        bytes::Bytes::from_static(b"ZZZ|nope"),
        "text/plain",
    )
    .await
    .unwrap();

    let webhook = WebhookAlertSink::new(secret_string(server.url())).unwrap();
    let handler = PipelineHandler::new(
        inbound,
        Arc::new(ObjectStoreBackend::in_memory()),
        Arc::new(webhook),
        HandlerSettings::default(),
    );

    let err = handler.handle(&object("in/bad.hl7")).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::MalformedMessage);
    mock.assert_async().await;
}

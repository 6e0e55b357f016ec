//! Webhook sink delivery against a mockito receiver.

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde_json::json;
use tempmail_core::{
    alerts::{AlertLevel, AlertManager, Rule, SinkError, WebhookSink},
    config::WebhookConfig,
};

use crate::mock_infrastructure::{RecordingSink, WebhookMock};

fn storage_rule() -> Rule {
    Rule::new("storage_unavailable", "Storage Unavailable", || true)
        .with_level(AlertLevel::Critical)
        .with_component("storage")
}

#[tokio::test]
async fn test_new_alert_is_posted_once() {
    let mut receiver = WebhookMock::new().await;
    receiver
        .expect_alert(
            json!({
                "id": "storage_unavailable-1",
                "title": "Storage Unavailable",
                "level": "critical",
                "component": "storage",
                "resolved": false
            }),
            200,
            1,
        )
        .await;

    let config = WebhookConfig { url: Some(receiver.url()), ..Default::default() };
    let sink = WebhookSink::from_config(&config).unwrap().unwrap();

    let manager = AlertManager::new();
    manager.add_sink(Arc::new(sink));
    manager.add_rule(storage_rule()).unwrap();

    manager.check_rules().await;
    // Dedup: the open alert is not posted again.
    manager.check_rules().await;
    manager.wait_for_deliveries().await;

    receiver.assert().await;
}

#[tokio::test]
async fn test_configured_headers_are_sent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/hook")
        .match_header("authorization", "Bearer hook-token")
        .with_status(202)
        .create_async()
        .await;

    let config = WebhookConfig {
        url: Some(format!("{}/hook", server.url())),
        timeout_seconds: 5,
        headers: HashMap::from([("authorization".to_string(), "Bearer hook-token".to_string())]),
    };
    let manager = AlertManager::new();
    manager.add_sink(Arc::new(WebhookSink::from_config(&config).unwrap().unwrap()));
    manager.add_rule(storage_rule()).unwrap();

    manager.check_rules().await;
    manager.wait_for_deliveries().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_receiver_error_is_reported_and_isolated() {
    let mut receiver = WebhookMock::new().await;
    receiver.expect_alert(json!({ "id": "storage_unavailable-1" }), 503, 2).await;

    let recording = Arc::new(RecordingSink::new("recording"));
    let manager = AlertManager::new().with_delivery_timeout(Duration::from_secs(5));
    manager.add_sink(Arc::new(WebhookSink::new(receiver.url(), Duration::from_secs(5)).unwrap()));
    manager.add_sink(recording.clone());
    manager.add_rule(storage_rule()).unwrap();

    let opened = manager.check_rules().await;
    let summaries = manager.wait_for_deliveries().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(recording.received_ids(), vec!["storage_unavailable-1".to_string()]);

    let summary = manager.dispatch(&opened[0]).await;
    assert_eq!(summary.delivered, vec!["recording".to_string()]);
    assert!(matches!(summary.failed[0].1, SinkError::Http { status: 503, .. }));
    receiver.assert().await;
}

#[test]
fn test_invalid_webhook_config_is_rejected() {
    let config = WebhookConfig { url: Some("smtp://mail.example.com".to_string()), ..Default::default() };
    assert!(matches!(WebhookSink::from_config(&config), Err(SinkError::InvalidConfig(_))));

    let config = WebhookConfig {
        url: Some("https://hooks.example.com".to_string()),
        headers: HashMap::from([("bad header".to_string(), "x".to_string())]),
        ..Default::default()
    };
    assert!(matches!(WebhookSink::from_config(&config), Err(SinkError::InvalidConfig(_))));
}

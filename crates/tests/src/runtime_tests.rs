//! Integration tests for the runtime builder and lifecycle.
//!
//! These cover the wiring contracts rather than individual rules:
//! - Builder validation catches configuration errors early
//! - Built-in checks, rules and sinks are registered from configuration
//! - Background tasks start only when enabled and stop on shutdown
//! - Shutdown is idempotent and reaches every receiver

use std::{sync::Arc, time::Duration};

use tempmail_core::{
    alerts::AlertError,
    clock::ManualClock,
    config::AppConfig,
    health::HealthStatus,
    runtime::{HealthRuntime, RuntimeError},
};
use tokio::time::timeout;

use crate::mock_infrastructure::{FakeMetrics, FakeStats, FakeStorage, RecordingSink, SlowSink};

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.environment = "test".to_string();
    config.alerts.evaluation_interval_seconds = 10;
    config.health.interval_seconds = 10;
    config
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = test_config();
    config.health.interval_seconds = 0;

    let result = HealthRuntime::builder()
        .with_config(config)
        .with_system_stats(FakeStats::with_memory_mb(10))
        .build();

    assert!(matches!(result, Err(RuntimeError::ConfigValidation(_))));
}

#[test]
fn test_custom_rule_with_bad_cooldown_is_rejected() {
    let result = HealthRuntime::builder()
        .with_config(test_config())
        .with_system_stats(FakeStats::with_memory_mb(10))
        .with_rule(
            tempmail_core::alerts::Rule::new("forever", "Forever", || false)
                .with_cooldown(Duration::MAX),
        )
        .build();

    assert!(matches!(result, Err(RuntimeError::Rule(AlertError::InvalidCooldown { .. }))));
}

#[tokio::test]
async fn test_storage_outage_end_to_end() {
    let clock = ManualClock::default();
    let stats = FakeStats::with_memory_mb(50);
    let storage = FakeStorage::up();
    let recording = Arc::new(RecordingSink::new("recording"));

    let runtime = HealthRuntime::builder()
        .with_config(test_config())
        .with_clock(Arc::new(clock.clone()))
        .with_system_stats(stats)
        .with_storage_probe(storage.clone())
        .with_metrics_source(Arc::new(FakeMetrics::default()))
        .with_sink(recording.clone())
        .build()
        .unwrap();

    let alerts = runtime.alert_manager();
    assert!(alerts.check_rules().await.is_empty());
    assert_eq!(runtime.health_checker().check_health().status, HealthStatus::Healthy);

    storage.set_up(false);
    let opened = alerts.check_rules().await;
    alerts.wait_for_deliveries().await;
    let ids: Vec<&str> = opened.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["storage_unavailable-1", "service_unhealthy-1"]);
    assert_eq!(recording.received_ids().len(), 2);

    storage.set_up(true);
    for alert in &opened {
        assert!(alerts.resolve_alert(&alert.id));
    }
    clock.advance(Duration::from_secs(301));
    assert!(alerts.check_rules().await.is_empty());
    assert_eq!(alerts.get_alerts().len(), 2);
    assert_eq!(alerts.active_alert_count(), 0);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_background_tasks_run_until_shutdown() {
    let stats = FakeStats::with_memory_mb(50);
    let recording = Arc::new(RecordingSink::new("recording"));

    let runtime = HealthRuntime::builder()
        .with_config(test_config())
        .with_system_stats(stats.clone())
        .with_sink(recording.clone())
        .enable_periodic_health()
        .enable_alert_monitoring()
        .build()
        .unwrap();
    assert_eq!(runtime.running_tasks(), 2);

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert!(runtime.alert_manager().last_evaluation_at().is_some());
    assert!(recording.received_ids().is_empty());

    stats.set_memory_mb(4096);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(recording.received_ids().contains(&"high_memory_usage-1".to_string()));

    timeout(Duration::from_secs(5), runtime.shutdown()).await.unwrap();
    assert_eq!(runtime.running_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_in_flight_deliveries() {
    let recording = Arc::new(RecordingSink::new("recording"));
    let runtime = HealthRuntime::builder()
        .with_config(test_config())
        .with_system_stats(FakeStats::with_memory_mb(10))
        .without_builtin_rules()
        .with_rule(tempmail_core::alerts::Rule::new("queue", "Queue Backlog", || true))
        .with_sink(Arc::new(SlowSink(Duration::from_secs(5))))
        .with_sink(recording.clone())
        .build()
        .unwrap();

    let opened = runtime.alert_manager().check_rules().await;
    assert_eq!(opened.len(), 1);
    assert!(recording.received_ids().is_empty());

    runtime.shutdown().await;
    assert_eq!(recording.received_ids(), vec!["queue-1".to_string()]);
}

#[tokio::test]
async fn test_shutdown_is_idempotent_and_broadcast() {
    let runtime = HealthRuntime::builder()
        .with_config(test_config())
        .with_system_stats(FakeStats::with_memory_mb(10))
        .enable_alert_monitoring()
        .build()
        .unwrap();

    let receivers: Vec<_> = (0..3).map(|_| runtime.shutdown_receiver()).collect();
    let waiters: Vec<_> = receivers
        .into_iter()
        .map(|mut rx| tokio::spawn(async move { rx.recv().await.is_ok() }))
        .collect();

    runtime.shutdown().await;
    runtime.shutdown().await;
    assert!(runtime.is_shutting_down());

    for waiter in waiters {
        assert!(timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap());
    }
}

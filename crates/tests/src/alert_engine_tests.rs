//! Integration tests for rule evaluation, cooldown, dedup and sink fan-out.
//!
//! Time-sensitive scenarios drive a `ManualClock` so cooldowns are exact; the
//! background monitoring test runs on Tokio's paused clock instead.

use std::{sync::Arc, time::Duration};

use tempmail_core::{
    alerts::{rules, AlertLevel, AlertManager, Rule},
    clock::{Clock, ManualClock},
    signals::SystemStatsSource,
};
use tokio::sync::broadcast;

use crate::mock_infrastructure::{FailingSink, FakeMetrics, FakeStats, RecordingSink, SlowSink};

const FIVE_MINUTES: Duration = Duration::from_secs(300);

fn manager() -> (AlertManager, ManualClock) {
    let clock = ManualClock::default();
    (AlertManager::new().with_clock(Arc::new(clock.clone())), clock)
}

fn memory_rule(stats: Arc<FakeStats>) -> Rule {
    Rule::fallible("mem", "High Memory Usage", move || Ok(stats.snapshot()?.memory_mb() > 1024))
        .with_cooldown(FIVE_MINUTES)
}

#[tokio::test]
async fn test_memory_rule_cooldown_resolve_and_reopen() {
    let (manager, clock) = manager();
    let stats = FakeStats::with_memory_mb(2048);
    manager.add_rule(memory_rule(stats)).unwrap();

    // Two checks inside the cooldown window open exactly one alert.
    manager.check_rules().await;
    clock.advance(Duration::from_secs(120));
    manager.check_rules().await;

    let active = manager.get_active_alerts();
    assert_eq!(active.len(), 1);
    let first_id = active[0].id.clone();

    assert!(manager.resolve_alert(&first_id));
    clock.advance(FIVE_MINUTES + Duration::from_secs(1));
    manager.check_rules().await;

    let active = manager.get_active_alerts();
    assert_eq!(active.len(), 1);
    assert_ne!(active[0].id, first_id);
    assert_eq!(manager.get_alerts().len(), 2);
}

#[tokio::test]
async fn test_open_alert_suppresses_refiring_after_cooldown() {
    let (manager, clock) = manager();
    let stats = FakeStats::with_memory_mb(4096);
    manager.add_rule(memory_rule(stats)).unwrap();

    for _ in 0..4 {
        manager.check_rules().await;
        clock.advance(FIVE_MINUTES * 2);
    }

    assert_eq!(manager.get_alerts().len(), 1);
    assert_eq!(manager.active_alert_count(), 1);
}

#[tokio::test]
async fn test_condition_clears_then_returns() {
    let (manager, clock) = manager();
    let stats = FakeStats::with_memory_mb(2048);
    manager.add_rule(memory_rule(stats.clone())).unwrap();

    manager.check_rules().await;
    let id = manager.get_active_alerts()[0].id.clone();

    stats.set_memory_mb(256);
    manager.resolve_alert(&id);
    clock.advance(FIVE_MINUTES * 2);
    assert!(manager.check_rules().await.is_empty());

    stats.set_memory_mb(2048);
    let reopened = manager.check_rules().await;
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened[0].id, "mem-2");
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let (manager, clock) = manager();
    manager.add_rule(Rule::new("disk", "Disk Full", || true)).unwrap();
    manager.check_rules().await;
    let id = manager.get_active_alerts()[0].id.clone();

    clock.advance(Duration::from_secs(5));
    assert!(manager.resolve_alert(&id));
    let resolved_at = manager.get_alert(&id).unwrap().resolved_at;

    clock.advance(Duration::from_secs(5));
    assert!(!manager.resolve_alert(&id));
    assert!(!manager.resolve_alert("never-existed"));

    let alert = manager.get_alert(&id).unwrap();
    assert!(alert.resolved);
    assert_eq!(alert.resolved_at, resolved_at);
}

#[tokio::test]
async fn test_failing_sink_does_not_block_others() {
    let (manager, _clock) = manager();
    let first = Arc::new(RecordingSink::new("first"));
    let last = Arc::new(RecordingSink::new("last"));
    manager.add_sink(first.clone());
    manager.add_sink(Arc::new(FailingSink));
    manager.add_sink(last.clone());
    manager.add_rule(Rule::new("queue", "Queue Backlog", || true)).unwrap();

    let opened = manager.check_rules().await;
    manager.wait_for_deliveries().await;

    assert_eq!(opened.len(), 1);
    assert_eq!(first.received_ids(), vec!["queue-1".to_string()]);
    assert_eq!(last.received_ids(), vec!["queue-1".to_string()]);

    let summary = manager.dispatch(&opened[0]).await;
    assert_eq!(summary.delivered, vec!["first".to_string(), "last".to_string()]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "failing");
}

#[tokio::test(start_paused = true)]
async fn test_slow_sink_bounded_by_delivery_timeout() {
    let manager = AlertManager::new().with_delivery_timeout(Duration::from_secs(2));
    let recording = Arc::new(RecordingSink::new("recording"));
    manager.add_sink(Arc::new(SlowSink(Duration::from_secs(3600))));
    manager.add_sink(recording.clone());
    manager.add_rule(Rule::new("slow", "Slow Receiver", || true)).unwrap();

    let started = tokio::time::Instant::now();
    manager.check_rules().await;
    manager.wait_for_deliveries().await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(recording.received_ids(), vec!["slow-1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_hung_sink_does_not_stall_monitoring() {
    let stats = FakeStats::with_memory_mb(64);
    let manager = Arc::new(AlertManager::new());
    let recording = Arc::new(RecordingSink::new("recording"));
    manager.add_sink(Arc::new(SlowSink(Duration::from_secs(3600))));
    manager.add_sink(recording.clone());
    manager.add_rule(Rule::new("first", "Always Firing", || true)).unwrap();
    manager.add_rule(memory_rule(stats.clone())).unwrap();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = manager.clone().start_monitoring(Duration::from_secs(30), shutdown_rx);

    // The first pass opens "first-1" and hands it to the hung sink.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(manager.get_alerts().len(), 1);

    // Later ticks keep evaluating while that delivery is still pending.
    stats.set_memory_mb(2048);
    tokio::time::sleep(Duration::from_secs(30)).await;
    let ids: Vec<String> = manager.get_alerts().into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["first-1".to_string(), "mem-1".to_string()]);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    manager.wait_for_deliveries().await;
    assert_eq!(recording.received_ids(), vec!["first-1".to_string(), "mem-1".to_string()]);
}

#[tokio::test]
async fn test_broken_rules_do_not_stop_the_pass() {
    let (manager, _clock) = manager();
    let stats = FakeStats::with_memory_mb(2048);
    stats.set_unavailable(true);

    manager.add_rule(rules::high_memory_rule(stats.clone(), 1024)).unwrap();
    manager.add_rule(Rule::new("explodes", "Explodes", || panic!("bad predicate"))).unwrap();
    manager.add_rule(Rule::new("healthy_rule", "Always Fires", || true)).unwrap();

    let opened = manager.check_rules().await;
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].id, "healthy_rule-1");

    stats.set_unavailable(false);
    let opened = manager.check_rules().await;
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].id, "high_memory_usage-1");
}

#[tokio::test]
async fn test_builtin_signal_rules() {
    let (manager, _clock) = manager();
    let stats = FakeStats::with_memory_mb(10);
    let metrics = Arc::new(FakeMetrics::default());
    let stats_source: Arc<dyn SystemStatsSource> = stats.clone();

    manager.add_rule(rules::high_cpu_rule(stats_source, 90.0)).unwrap();
    manager.add_rule(rules::high_error_rate_rule(metrics.clone(), 0.05)).unwrap();

    // Neither signal is wired yet.
    assert!(manager.check_rules().await.is_empty());

    stats.set_cpu(Some(99.0));
    metrics.set_error_rate(Some(0.5));
    let opened = manager.check_rules().await;

    let ids: Vec<&str> = opened.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["high_cpu_usage-1", "high_error_rate-1"]);
    assert!(opened.iter().all(|a| a.level == AlertLevel::Warning));
}

#[tokio::test]
async fn test_alert_json_shape() {
    let (manager, clock) = manager();
    manager
        .add_rule(
            Rule::new("storage_unavailable", "Storage Unavailable", || true)
                .with_level(AlertLevel::Critical)
                .with_component("storage")
                .with_message("storage ping failed"),
        )
        .unwrap();
    manager.check_rules().await;

    let alert = manager.get_alert("storage_unavailable-1").unwrap();
    let json = serde_json::to_value(&alert).unwrap();

    assert_eq!(json["id"], "storage_unavailable-1");
    assert_eq!(json["title"], "Storage Unavailable");
    assert_eq!(json["message"], "storage ping failed");
    assert_eq!(json["level"], "critical");
    assert_eq!(json["component"], "storage");
    assert_eq!(json["resolved"], false);
    assert!(json.get("resolved_at").is_none());
    assert!(json.get("rule_id").is_none());
    assert_eq!(json["metadata"]["epoch"], 1);
    assert_eq!(
        json["timestamp"].as_str().unwrap(),
        serde_json::to_value(clock.now()).unwrap().as_str().unwrap()
    );
}

#[tokio::test(start_paused = true)]
async fn test_background_monitoring_opens_and_stops() {
    let stats = FakeStats::with_memory_mb(64);
    let manager = Arc::new(AlertManager::new());
    let recording = Arc::new(RecordingSink::new("recording"));
    manager.add_sink(recording.clone());
    manager.add_rule(memory_rule(stats.clone())).unwrap();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = manager.clone().start_monitoring(Duration::from_secs(30), shutdown_rx);

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert!(manager.get_alerts().is_empty());

    stats.set_memory_mb(2048);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(recording.received_ids(), vec!["mem-1".to_string()]);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
}

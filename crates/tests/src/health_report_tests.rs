//! Integration tests for health aggregation and the built-in checks.

use std::{sync::Arc, time::Duration};

use tempmail_core::{
    alerts::AlertManager,
    clock::{Clock, ManualClock},
    health::{
        CheckOutcome, EvaluatorLivenessCheck, FnHealthCheck, HealthCheckError, HealthChecker,
        HealthStatus, MemoryCheck, StorageCheck, ThreadCheck,
    },
    utils::format_uptime,
};
use tokio::sync::broadcast;

use crate::mock_infrastructure::{FakeStats, FakeStorage};

fn fixed(name: &str, outcome: CheckOutcome) -> Arc<FnHealthCheck> {
    Arc::new(FnHealthCheck::new(name, move || Ok(outcome.clone())))
}

#[test]
fn test_worst_status_wins() {
    let checker = HealthChecker::new("1.0.0", "test")
        .with_check(fixed("a", CheckOutcome::healthy("ok")))
        .with_check(fixed("b", CheckOutcome::degraded("slow")))
        .with_check(fixed("c", CheckOutcome::healthy("ok")));

    let report = checker.check_health();

    assert_eq!(report.status, HealthStatus::Degraded);
    assert_eq!(report.checks.len(), 3);
    assert!(!checker.is_healthy());
}

#[test]
fn test_failures_are_contained_per_check() {
    let checker = HealthChecker::new("1.0.0", "test")
        .with_check(Arc::new(FnHealthCheck::new("errors", || {
            Err(HealthCheckError::Failed("disk read failed".to_string()))
        })))
        .with_check(Arc::new(FnHealthCheck::new("panics", || -> Result<CheckOutcome, HealthCheckError> {
            panic!("probe bug")
        })))
        .with_check(fixed("fine", CheckOutcome::healthy("ok")));

    let report = checker.check_health();
    let names: Vec<&str> = report.checks.iter().map(|c| c.name.as_str()).collect();

    assert_eq!(names, vec!["errors", "panics", "fine"]);
    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert_eq!(report.checks[0].status, HealthStatus::Unhealthy);
    assert!(report.checks[0].message.contains("disk read failed"));
    assert_eq!(report.checks[1].status, HealthStatus::Unhealthy);
    assert!(report.checks[1].message.contains("probe bug"));
    assert_eq!(report.checks[2].status, HealthStatus::Healthy);
}

#[test]
fn test_builtin_checks_follow_signals() {
    let stats = FakeStats::with_memory_mb(100);
    stats.set_threads(12);
    let storage = FakeStorage::up();

    let checker = HealthChecker::new("1.0.0", "test")
        .with_check(Arc::new(StorageCheck::new(storage.clone())))
        .with_check(Arc::new(MemoryCheck::new(stats.clone(), 512, 1024)))
        .with_check(Arc::new(ThreadCheck::new(stats.clone(), 1000)));
    assert_eq!(checker.check_health().status, HealthStatus::Healthy);

    stats.set_memory_mb(700);
    assert_eq!(checker.check_health().status, HealthStatus::Degraded);

    stats.set_memory_mb(100);
    stats.set_threads(5000);
    assert_eq!(checker.check_health().status, HealthStatus::Degraded);

    storage.set_up(false);
    let report = checker.check_health();
    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert_eq!(report.failing_checks().next().map(|c| c.name.as_str()), Some("storage"));
}

#[test]
fn test_report_json_and_uptime() {
    let clock = ManualClock::default();
    let checker = HealthChecker::new("2.4.1", "staging")
        .with_clock(Arc::new(clock.clone()))
        .with_check(fixed("storage", CheckOutcome::healthy("ping ok")));

    clock.advance(Duration::from_secs(90_061));
    assert_eq!(checker.uptime(), Duration::from_secs(90_061));

    let json = serde_json::to_value(checker.check_health()).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["uptime"], format_uptime(Duration::from_secs(90_061)));
    assert_eq!(json["uptime"], "1d 1h 1m 1s");
    assert_eq!(json["version"], "2.4.1");
    assert_eq!(json["environment"], "staging");

    let check = &json["checks"][0];
    assert_eq!(check["name"], "storage");
    assert_eq!(check["status"], "healthy");
    assert_eq!(check["message"], "ping ok");
    assert!(check["duration"].is_string());
    assert_eq!(check["last_checked"], serde_json::to_value(clock.now()).unwrap());
}

#[tokio::test]
async fn test_evaluator_liveness_goes_stale() {
    let clock = ManualClock::default();
    let alerts =
        Arc::new(AlertManager::new().with_clock(Arc::new(clock.clone())));
    let liveness =
        EvaluatorLivenessCheck::new(alerts.clone(), Arc::new(clock.clone()), Duration::from_secs(30));
    let checker = HealthChecker::new("1.0.0", "test").with_check(Arc::new(liveness));

    alerts.check_rules().await;
    assert_eq!(checker.check_health().status, HealthStatus::Healthy);

    clock.advance(Duration::from_secs(91));
    assert_eq!(checker.check_health().status, HealthStatus::Degraded);

    alerts.check_rules().await;
    assert_eq!(checker.check_health().status, HealthStatus::Healthy);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_health_task_stops_on_shutdown() {
    let checker = Arc::new(
        HealthChecker::new("1.0.0", "test").with_check(fixed("a", CheckOutcome::degraded("slow"))),
    );
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = checker.start_with_shutdown(Duration::from_secs(60), shutdown_rx);
    tokio::time::sleep(Duration::from_secs(130)).await;

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
}

//! Built-in alert rules over the engine's signal sources.
//!
//! Each factory returns a [`Rule`] with the default cooldown; callers may
//! adjust it with the `with_*` builders before registering.

use std::{sync::Arc, time::Duration};

use super::types::{AlertLevel, Rule};
use crate::{
    health::{HealthChecker, HealthStatus},
    signals::{MetricsSource, StorageProbe, SystemStatsSource},
};

/// Fires when resident memory exceeds `threshold_mb`.
#[must_use]
pub fn high_memory_rule(stats: Arc<dyn SystemStatsSource>, threshold_mb: u64) -> Rule {
    Rule::fallible("high_memory_usage", "High Memory Usage", move || {
        Ok(stats.snapshot()?.memory_mb() > threshold_mb)
    })
    .with_level(AlertLevel::Warning)
    .with_component("system")
    .with_message(format!("Memory usage exceeds {threshold_mb}MB"))
}

/// Fires when accumulated garbage-collection pause time exceeds `threshold`.
#[must_use]
pub fn high_gc_pause_rule(stats: Arc<dyn SystemStatsSource>, threshold: Duration) -> Rule {
    Rule::fallible("high_gc_pause", "High GC Pause Time", move || {
        Ok(stats.snapshot()?.gc_pause_total > threshold)
    })
    .with_level(AlertLevel::Warning)
    .with_component("system")
    .with_message(format!("Total GC pause time exceeds {}ms", threshold.as_millis()))
}

/// Fires when the storage ping fails.
#[must_use]
pub fn storage_down_rule(probe: Arc<dyn StorageProbe>) -> Rule {
    Rule::new("storage_unavailable", "Storage Unavailable", move || probe.ping().is_err())
        .with_level(AlertLevel::Critical)
        .with_component("storage")
        .with_message("Storage backend is not responding")
}

/// Fires when the HTTP error rate exceeds `threshold` (a fraction, e.g. `0.05`).
///
/// Never fires while the metrics source has no error-rate counter wired.
#[must_use]
pub fn high_error_rate_rule(metrics: Arc<dyn MetricsSource>, threshold: f64) -> Rule {
    Rule::new("high_error_rate", "High Error Rate", move || {
        metrics.http_error_rate().is_some_and(|rate| rate > threshold)
    })
    .with_level(AlertLevel::Warning)
    .with_component("http")
    .with_message(format!("HTTP error rate exceeds {:.1}%", threshold * 100.0))
}

/// Fires when process CPU usage exceeds `threshold_percent`.
///
/// Never fires until the stats source reports a CPU figure.
#[must_use]
pub fn high_cpu_rule(stats: Arc<dyn SystemStatsSource>, threshold_percent: f64) -> Rule {
    Rule::fallible("high_cpu_usage", "High CPU Usage", move || {
        Ok(stats.snapshot()?.cpu_usage_percent.is_some_and(|cpu| cpu > threshold_percent))
    })
    .with_level(AlertLevel::Warning)
    .with_component("system")
    .with_message(format!("CPU usage exceeds {threshold_percent:.0}%"))
}

/// Fires when the aggregated health status is unhealthy.
#[must_use]
pub fn unhealthy_service_rule(checker: Arc<HealthChecker>) -> Rule {
    Rule::new("service_unhealthy", "Service Unhealthy", move || {
        checker.check_health().status == HealthStatus::Unhealthy
    })
    .with_level(AlertLevel::Critical)
    .with_component("health")
    .with_message("One or more health checks report unhealthy")
}

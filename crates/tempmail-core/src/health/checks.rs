//! Health check sources.

use std::{sync::Arc, time::Duration};

use thiserror::Error;

use super::types::CheckOutcome;
use crate::{
    alerts::AlertManager,
    clock::{elapsed_between, Clock},
    signals::{StorageProbe, SystemStatsSource},
};

/// Errors a health check may return instead of an outcome.
///
/// The aggregator turns any error into an unhealthy entry for that check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HealthCheckError {
    #[error("check failed: {0}")]
    Failed(String),

    #[error("check panicked: {0}")]
    Panicked(String),
}

/// A named probe producing one health status.
///
/// Implementations must be cheap and bound their own work; the aggregator runs
/// them synchronously and does not impose a timeout.
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    /// Runs the probe.
    ///
    /// # Errors
    ///
    /// Returns [`HealthCheckError`] when the probe itself could not run.
    fn check(&self) -> Result<CheckOutcome, HealthCheckError>;
}

type CheckFn = dyn Fn() -> Result<CheckOutcome, HealthCheckError> + Send + Sync;

/// Health check backed by a closure.
pub struct FnHealthCheck {
    name: String,
    check: Box<CheckFn>,
}

impl FnHealthCheck {
    #[must_use]
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> Result<CheckOutcome, HealthCheckError> + Send + Sync + 'static,
    {
        Self { name: name.into(), check: Box::new(check) }
    }
}

impl HealthCheck for FnHealthCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<CheckOutcome, HealthCheckError> {
        (self.check)()
    }
}

/// Pings the storage layer; unreachable storage is unhealthy.
pub struct StorageCheck {
    probe: Arc<dyn StorageProbe>,
}

impl StorageCheck {
    #[must_use]
    pub fn new(probe: Arc<dyn StorageProbe>) -> Self {
        Self { probe }
    }
}

impl HealthCheck for StorageCheck {
    fn name(&self) -> &str {
        "storage"
    }

    fn check(&self) -> Result<CheckOutcome, HealthCheckError> {
        Ok(match self.probe.ping() {
            Ok(()) => CheckOutcome::healthy("storage is reachable"),
            Err(e) => CheckOutcome::unhealthy(e.to_string()),
        })
    }
}

/// Compares resident memory against warning and critical thresholds.
pub struct MemoryCheck {
    stats: Arc<dyn SystemStatsSource>,
    warning_mb: u64,
    critical_mb: u64,
}

impl MemoryCheck {
    #[must_use]
    pub fn new(stats: Arc<dyn SystemStatsSource>, warning_mb: u64, critical_mb: u64) -> Self {
        Self { stats, warning_mb, critical_mb }
    }
}

impl HealthCheck for MemoryCheck {
    fn name(&self) -> &str {
        "memory"
    }

    fn check(&self) -> Result<CheckOutcome, HealthCheckError> {
        let snapshot = self.stats.snapshot().map_err(|e| HealthCheckError::Failed(e.to_string()))?;
        let used = snapshot.memory_mb();

        Ok(if used >= self.critical_mb {
            CheckOutcome::unhealthy(format!(
                "memory usage {used}MB exceeds critical threshold {}MB",
                self.critical_mb
            ))
        } else if used >= self.warning_mb {
            CheckOutcome::degraded(format!(
                "memory usage {used}MB exceeds warning threshold {}MB",
                self.warning_mb
            ))
        } else {
            CheckOutcome::healthy(format!("memory usage {used}MB"))
        })
    }
}

/// Flags an unusually high number of OS threads.
pub struct ThreadCheck {
    stats: Arc<dyn SystemStatsSource>,
    max_threads: usize,
}

impl ThreadCheck {
    #[must_use]
    pub fn new(stats: Arc<dyn SystemStatsSource>, max_threads: usize) -> Self {
        Self { stats, max_threads }
    }
}

impl HealthCheck for ThreadCheck {
    fn name(&self) -> &str {
        "threads"
    }

    fn check(&self) -> Result<CheckOutcome, HealthCheckError> {
        let snapshot = self.stats.snapshot().map_err(|e| HealthCheckError::Failed(e.to_string()))?;
        let count = snapshot.thread_count;

        Ok(if count > self.max_threads {
            CheckOutcome::degraded(format!("{count} threads exceeds limit {}", self.max_threads))
        } else {
            CheckOutcome::healthy(format!("{count} threads"))
        })
    }
}

/// Reports whether the alert evaluator is still ticking.
///
/// Degraded once the last evaluation is older than three intervals, or when
/// no evaluation has happened that long after the check was created.
pub struct EvaluatorLivenessCheck {
    alerts: Arc<AlertManager>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl EvaluatorLivenessCheck {
    const MISSED_TICKS: u32 = 3;

    #[must_use]
    pub fn new(alerts: Arc<AlertManager>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self { created_at: clock.now(), alerts, clock, interval }
    }
}

impl HealthCheck for EvaluatorLivenessCheck {
    fn name(&self) -> &str {
        "alert_evaluator"
    }

    fn check(&self) -> Result<CheckOutcome, HealthCheckError> {
        let limit = self.interval.saturating_mul(Self::MISSED_TICKS);
        let now = self.clock.now();

        Ok(match self.alerts.last_evaluation_at() {
            Some(last) => {
                let age = elapsed_between(last, now);
                if age > limit {
                    CheckOutcome::degraded(format!(
                        "last rule evaluation was {}s ago",
                        age.as_secs()
                    ))
                } else {
                    CheckOutcome::healthy(format!("last rule evaluation {}s ago", age.as_secs()))
                }
            }
            None if elapsed_between(self.created_at, now) > limit => {
                CheckOutcome::degraded("rule evaluation has not run yet")
            }
            None => CheckOutcome::healthy("waiting for first rule evaluation"),
        })
    }
}

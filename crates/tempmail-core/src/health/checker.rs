use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tokio::{sync::broadcast, task::JoinHandle, time::interval};
use tracing::{debug, error, warn};

use super::{
    checks::{HealthCheck, HealthCheckError},
    types::{HealthCheckResult, HealthReport, HealthStatus},
};
use crate::{
    clock::{elapsed_between, Clock, SystemClock},
    metrics,
    utils::panic_message,
};

/// Runs a fixed, ordered set of [`HealthCheck`]s and aggregates their results.
///
/// Checks are registered while building the checker and never change
/// afterwards, so [`HealthChecker::check_health`] needs no locking. Each check
/// is isolated: an error or panic marks only that entry unhealthy.
pub struct HealthChecker {
    checks: Vec<Arc<dyn HealthCheck>>,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
    version: String,
    environment: String,
}

impl HealthChecker {
    #[must_use]
    pub fn new(version: impl Into<String>, environment: impl Into<String>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            started_at: clock.now(),
            checks: Vec::new(),
            clock,
            version: version.into(),
            environment: environment.into(),
        }
    }

    /// Replaces the clock and restarts the uptime counter from its current time.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.started_at = clock.now();
        self.clock = clock;
        self
    }

    /// Appends a check. Checks run in the order they were added.
    #[must_use]
    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Names of the registered checks in run order.
    #[must_use]
    pub fn check_names(&self) -> Vec<String> {
        self.checks.iter().map(|c| c.name().to_string()).collect()
    }

    /// Runs every check once and builds a report.
    #[must_use]
    pub fn check_health(&self) -> HealthReport {
        let checks: Vec<HealthCheckResult> = self.checks.iter().map(|c| self.run_check(c)).collect();
        let status = HealthReport::worst_status(&checks);
        metrics::record_health_status(status);

        HealthReport {
            status,
            timestamp: self.clock.now(),
            uptime: self.uptime(),
            checks,
            version: self.version.clone(),
            environment: self.environment.clone(),
        }
    }

    /// Returns `true` when the overall status is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.check_health().status == HealthStatus::Healthy
    }

    /// Time since the checker was created.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        elapsed_between(self.started_at, self.clock.now())
    }

    fn run_check(&self, check: &Arc<dyn HealthCheck>) -> HealthCheckResult {
        let checked_at = self.clock.now();
        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| check.check()));
        let duration = started.elapsed();

        let (status, message) = match outcome {
            Ok(Ok(outcome)) => (outcome.status, outcome.message),
            Ok(Err(e)) => {
                warn!(check = check.name(), error = %e, "health check failed");
                (HealthStatus::Unhealthy, e.to_string())
            }
            Err(payload) => {
                let e = HealthCheckError::Panicked(panic_message(payload.as_ref()));
                error!(check = check.name(), error = %e, "health check panicked");
                (HealthStatus::Unhealthy, e.to_string())
            }
        };

        HealthCheckResult { name: check.name().to_string(), status, message, duration, checked_at }
    }

    /// Starts a background task that checks health every `check_interval` and
    /// logs the report at a level matching its status.
    ///
    /// The task stops when `shutdown_rx` receives a value or its sender is dropped.
    #[must_use]
    pub fn start_with_shutdown(
        self: Arc<Self>,
        check_interval: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(check_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.recv() => {
                        debug!("periodic health check shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let report = self.check_health();
                        log_report(&report);
                    }
                }
            }
        })
    }
}

fn log_report(report: &HealthReport) {
    let failing: Vec<&str> = report.failing_checks().map(|c| c.name.as_str()).collect();

    match report.status {
        HealthStatus::Unhealthy => error!(
            status = %report.status,
            failing = ?failing,
            uptime_secs = report.uptime.as_secs(),
            "health check reported unhealthy"
        ),
        HealthStatus::Degraded => warn!(
            status = %report.status,
            failing = ?failing,
            uptime_secs = report.uptime.as_secs(),
            "health check reported degraded"
        ),
        HealthStatus::Healthy => debug!(
            status = %report.status,
            checks = report.checks.len(),
            uptime_secs = report.uptime.as_secs(),
            "health check passed"
        ),
    }
}

//! Health type definitions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{serialize_short_duration, serialize_uptime};

/// Status of a single check or of the whole process.
///
/// Variants are ordered by severity so the overall status is simply the maximum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Working as expected.
    #[default]
    Healthy,
    /// Working, but something needs attention.
    Degraded,
    /// Not working.
    Unhealthy,
}

impl HealthStatus {
    /// Returns the lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }

    /// Returns a numeric value for gauges (`0` healthy, `1` degraded, `2` unhealthy).
    #[must_use]
    pub fn as_gauge_value(&self) -> f64 {
        match self {
            Self::Healthy => 0.0,
            Self::Degraded => 1.0,
            Self::Unhealthy => 2.0,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status and message produced by a health check before timing is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub status: HealthStatus,
    pub message: String,
}

impl CheckOutcome {
    #[must_use]
    pub fn healthy(message: impl Into<String>) -> Self {
        Self { status: HealthStatus::Healthy, message: message.into() }
    }

    #[must_use]
    pub fn degraded(message: impl Into<String>) -> Self {
        Self { status: HealthStatus::Degraded, message: message.into() }
    }

    #[must_use]
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self { status: HealthStatus::Unhealthy, message: message.into() }
    }
}

/// Result of running one health check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub name: String,
    pub status: HealthStatus,
    pub message: String,
    /// How long the check took to run.
    #[serde(serialize_with = "serialize_short_duration")]
    pub duration: Duration,
    #[serde(rename = "last_checked")]
    pub checked_at: DateTime<Utc>,
}

/// Aggregated snapshot of every registered check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Worst status among `checks`, or healthy when there are none.
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_uptime")]
    pub uptime: Duration,
    pub checks: Vec<HealthCheckResult>,
    pub version: String,
    pub environment: String,
}

impl HealthReport {
    /// Returns the worst status in `checks`.
    #[must_use]
    pub fn worst_status(checks: &[HealthCheckResult]) -> HealthStatus {
        checks.iter().map(|c| c.status).max().unwrap_or(HealthStatus::Healthy)
    }

    /// Returns the checks that are not healthy.
    pub fn failing_checks(&self) -> impl Iterator<Item = &HealthCheckResult> {
        self.checks.iter().filter(|c| c.status != HealthStatus::Healthy)
    }
}

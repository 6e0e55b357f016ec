//! Read-only signal sources consumed by health checks and alert rules.
//!
//! The engine never owns these subsystems. Storage, the metrics registry and the
//! process statistics reader are injected behind the traits below; closures
//! implement each trait so tests and embedders can wire ad-hoc sources.

pub mod process;

use std::time::Duration;

use thiserror::Error;

pub use process::ProcessStatsReader;

/// Errors returned by a [`SystemStatsSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatsError {
    /// The statistics backend could not produce a snapshot.
    #[error("process statistics unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by a [`StorageProbe`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    /// The storage backend did not answer the ping.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Point-in-time view of the host process.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemSnapshot {
    /// Resident memory in bytes.
    pub memory_bytes: u64,
    /// Number of OS threads in the process.
    pub thread_count: usize,
    /// Accumulated garbage-collection pause time reported by the runtime.
    pub gc_pause_total: Duration,
    /// CPU usage in percent, `None` until the reader has a baseline sample.
    pub cpu_usage_percent: Option<f64>,
}

impl SystemSnapshot {
    /// Resident memory in whole mebibytes.
    #[must_use]
    pub fn memory_mb(&self) -> u64 {
        self.memory_bytes / (1024 * 1024)
    }
}

/// Produces [`SystemSnapshot`]s on demand.
pub trait SystemStatsSource: Send + Sync {
    /// Takes a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError`] when the backend cannot be read.
    fn snapshot(&self) -> Result<SystemSnapshot, StatsError>;
}

impl<F> SystemStatsSource for F
where
    F: Fn() -> Result<SystemSnapshot, StatsError> + Send + Sync,
{
    fn snapshot(&self) -> Result<SystemSnapshot, StatsError> {
        self()
    }
}

/// Liveness ping against the storage layer.
pub trait StorageProbe: Send + Sync {
    /// Pings the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend is unreachable.
    fn ping(&self) -> Result<(), StorageError>;
}

impl<F> StorageProbe for F
where
    F: Fn() -> Result<(), StorageError> + Send + Sync,
{
    fn ping(&self) -> Result<(), StorageError> {
        self()
    }
}

/// Derived values read from the metrics-counter registry.
///
/// Each accessor returns `None` while the underlying counter is not wired.
pub trait MetricsSource: Send + Sync {
    /// Fraction of HTTP responses that were errors, in `0.0..=1.0`.
    fn http_error_rate(&self) -> Option<f64>;
}

/// Metrics source for deployments without a counter registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwiredMetrics;

impl MetricsSource for UnwiredMetrics {
    fn http_error_rate(&self) -> Option<f64> {
        None
    }
}

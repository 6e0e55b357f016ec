//! Health aggregation.
//!
//! A [`HealthChecker`] owns an ordered list of [`HealthCheck`] sources and turns
//! their results into a [`HealthReport`] whose status is the worst status of any
//! source. Reports can be pulled on demand or logged periodically.
//!
//! ```rust
//! use std::sync::Arc;
//! use tempmail_core::health::{CheckOutcome, FnHealthCheck, HealthChecker, HealthStatus};
//!
//! let checker = HealthChecker::new("1.0.0", "development")
//!     .with_check(Arc::new(FnHealthCheck::new("cache", || Ok(CheckOutcome::healthy("warm")))))
//!     .with_check(Arc::new(FnHealthCheck::new("queue", || Ok(CheckOutcome::degraded("backlog")))));
//!
//! assert_eq!(checker.check_health().status, HealthStatus::Degraded);
//! ```

pub mod checker;
pub mod checks;
pub mod types;

pub use checker::HealthChecker;
pub use checks::{
    EvaluatorLivenessCheck, FnHealthCheck, HealthCheck, HealthCheckError, MemoryCheck,
    StorageCheck, ThreadCheck,
};
pub use types::{CheckOutcome, HealthCheckResult, HealthReport, HealthStatus};

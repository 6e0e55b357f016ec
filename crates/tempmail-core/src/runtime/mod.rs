//! Runtime initialization and lifecycle management.
//!
//! Wires the [`HealthChecker`](crate::health::HealthChecker) and the
//! [`AlertManager`](crate::alerts::AlertManager) to their signal sources, registers
//! the built-in checks, rules and sinks, and owns the two background tasks
//! (periodic health logging and rule evaluation) behind one shutdown channel.
//!
//! ```no_run
//! use tempmail_core::{config::AppConfig, runtime::HealthRuntime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = HealthRuntime::builder()
//!         .with_config(AppConfig::load()?)
//!         .enable_periodic_health()
//!         .enable_alert_monitoring()
//!         .build()?;
//!
//!     let alerts = runtime.alert_manager().clone();
//!     // ... expose `alerts` over HTTP ...
//!
//!     runtime.wait_for_shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod components;
pub mod lifecycle;

pub use builder::{HealthRuntimeBuilder, RuntimeError};
pub use components::HealthComponents;
pub use lifecycle::HealthRuntime;

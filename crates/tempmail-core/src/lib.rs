//! # Tempmail Core
//!
//! Health aggregation and rule-based alerting for the temporary-email backend.
//!
//! - **[`health`]**: ordered health check sources folded into one report whose
//!   status is the worst status of any source.
//! - **[`alerts`]**: cooldown-gated rules that open deduplicated alerts and fan
//!   them out to log and webhook sinks.
//! - **[`signals`]**: read-only collaborator traits for process stats, storage
//!   liveness and HTTP metrics, plus a `sysinfo`-backed process reader.
//! - **[`runtime`]**: builder wiring everything together and owning the two
//!   background tasks behind one shutdown channel.
//! - **[`config`]**: layered TOML and environment configuration.
//! - **[`metrics`]**: counters and gauges the engine emits about itself.
//!
//! ## Evaluation Flow
//!
//! ```text
//!   ticker (evaluation_interval)
//!        │
//!        ▼
//! ┌──────────────┐   in cooldown   ┌──────┐
//! │ cooldown gate│ ──────────────► │ skip │
//! └──────┬───────┘                 └──────┘
//!        │ due
//!        ▼
//! ┌──────────────┐   false / error / panic
//! │  predicate   │ ──────────────────────► next rule
//! └──────┬───────┘
//!        │ true
//!        ▼
//! ┌──────────────────────────┐   open alert exists
//! │ write lock: re-check,    │ ──────────────────► next rule
//! │ dedup, insert, stamp     │
//! └──────┬───────────────────┘
//!        │ new alert, spawned ──► next rule
//!        ▼
//! ┌──────────────┐
//! │ sinks (each  │  log ─► webhook ─► ...
//! │  isolated)   │
//! └──────────────┘
//! ```

pub mod alerts;
pub mod clock;
pub mod config;
pub mod health;
pub mod metrics;
pub mod runtime;
pub mod signals;
pub mod utils;

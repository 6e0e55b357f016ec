//! Rule-based alerting.
//!
//! The [`AlertManager`] holds a registry of [`Rule`]s, the table of [`Alert`]s
//! they have opened and the [`AlertSink`](sinks::AlertSink)s alerts are sent to.
//! Each evaluation pass runs every rule whose cooldown has elapsed; a rule that
//! fires while it already has an unresolved alert is deduplicated.
//!
//! ```rust
//! use tempmail_core::alerts::{AlertLevel, AlertManager, Rule};
//!
//! let manager = AlertManager::new();
//! manager
//!     .add_rule(Rule::new("queue_backlog", "Queue Backlog", || false).with_level(AlertLevel::Info))
//!     .unwrap();
//!
//! assert_eq!(manager.rule_ids(), vec!["queue_backlog".to_string()]);
//! assert!(manager.get_active_alerts().is_empty());
//! ```

pub mod dispatcher;
pub mod errors;
pub mod evaluator;
pub mod manager;
pub mod rules;
pub mod sinks;
pub mod store;
pub mod types;

pub use dispatcher::{AlertDispatcher, DispatchSummary};
pub use errors::AlertError;
pub use manager::{AlertManager, DEFAULT_DELIVERY_TIMEOUT};
pub use sinks::{AlertSink, LogSink, SinkError, WebhookSink};
pub use store::{AlertStore, ResolveOutcome};
pub use types::{Alert, AlertLevel, ConditionResult, Rule, RuleState, DEFAULT_COOLDOWN};

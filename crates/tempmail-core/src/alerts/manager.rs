//! Alert management and storage.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    dispatcher::{AlertDispatcher, DispatchSummary},
    errors::AlertError,
    sinks::AlertSink,
    store::{AlertStore, ResolveOutcome},
    types::{Alert, Rule, RuleState},
};
use crate::clock::{elapsed_between, Clock, SystemClock};

/// Per-sink delivery bound used unless overridden with
/// [`AlertManager::with_delivery_timeout`].
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// A registered rule plus the bookkeeping only the evaluator mutates.
#[derive(Debug, Clone)]
pub(super) struct RuleEntry {
    pub(super) rule: Rule,
    pub(super) last_triggered_at: Option<DateTime<Utc>>,
    pub(super) epoch: u64,
}

impl RuleEntry {
    /// Returns `true` once the rule's cooldown has elapsed at `now`.
    pub(super) fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.last_triggered_at.map_or(true, |last| elapsed_between(last, now) >= self.rule.cooldown)
    }

    fn state(&self) -> RuleState {
        RuleState {
            id: self.rule.id.clone(),
            name: self.rule.name.clone(),
            level: self.rule.level,
            component: self.rule.component.clone(),
            cooldown_seconds: self.rule.cooldown.as_secs(),
            last_triggered_at: self.last_triggered_at,
            alerts_opened: self.epoch,
        }
    }
}

/// Everything guarded by the manager's single reader/writer lock.
#[derive(Default)]
pub(super) struct AlertState {
    pub(super) rules: Vec<RuleEntry>,
    pub(super) store: AlertStore,
    pub(super) sinks: Vec<Arc<dyn AlertSink>>,
    pub(super) last_evaluation_at: Option<DateTime<Utc>>,
}

/// Coordinator owning the rule registry, the alert table and the sink list.
///
/// All three live behind one [`RwLock`]: snapshots and lookups share the read
/// side, while registration, alert insert/resolve and cooldown updates take the
/// write side. Rule predicates and sink deliveries always run with the lock
/// released, and deliveries run on their own tasks so a slow sink never holds
/// up an evaluation pass. See [`AlertManager::check_rules`] for the algorithm.
pub struct AlertManager {
    pub(super) state: RwLock<AlertState>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) dispatcher: AlertDispatcher,
    deliveries: Mutex<Vec<JoinHandle<DispatchSummary>>>,
}

impl AlertManager {
    /// Creates an empty manager using the system clock and
    /// [`DEFAULT_DELIVERY_TIMEOUT`] per sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(AlertState::default()),
            clock: Arc::new(SystemClock),
            dispatcher: AlertDispatcher::new(Some(DEFAULT_DELIVERY_TIMEOUT)),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bounds each individual sink delivery.
    #[must_use]
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.dispatcher = AlertDispatcher::new(Some(timeout));
        self
    }

    // ========== Rule Management ==========

    /// Registers a rule.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::EmptyRuleId`], [`AlertError::InvalidCooldown`] or
    /// [`AlertError::DuplicateRuleId`]; the registry is unchanged in every case.
    pub fn add_rule(&self, rule: Rule) -> Result<(), AlertError> {
        if rule.id.trim().is_empty() {
            return Err(AlertError::EmptyRuleId);
        }
        if let Err(e) = chrono::Duration::from_std(rule.cooldown) {
            return Err(AlertError::InvalidCooldown { rule_id: rule.id, reason: e.to_string() });
        }

        let mut state = self.state.write();
        if state.rules.iter().any(|entry| entry.rule.id == rule.id) {
            return Err(AlertError::DuplicateRuleId(rule.id));
        }

        debug!(
            rule_id = %rule.id,
            level = %rule.level,
            cooldown_secs = rule.cooldown.as_secs(),
            "alert rule registered"
        );
        state.rules.push(RuleEntry { rule, last_triggered_at: None, epoch: 0 });
        Ok(())
    }

    /// IDs of the registered rules in evaluation order.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<String> {
        self.state.read().rules.iter().map(|entry| entry.rule.id.clone()).collect()
    }

    /// Snapshot of every rule's cooldown bookkeeping.
    #[must_use]
    pub fn rule_states(&self) -> Vec<RuleState> {
        self.state.read().rules.iter().map(RuleEntry::state).collect()
    }

    // ========== Sink Management ==========

    /// Registers a sink. Sinks receive alerts in registration order.
    pub fn add_sink(&self, sink: Arc<dyn AlertSink>) {
        debug!(sink = sink.name(), "alert sink registered");
        self.state.write().sinks.push(sink);
    }

    #[must_use]
    pub fn sink_names(&self) -> Vec<String> {
        self.state.read().sinks.iter().map(|s| s.name().to_string()).collect()
    }

    /// Delivers `alert` to every registered sink and waits for the outcome.
    pub async fn dispatch(&self, alert: &Alert) -> DispatchSummary {
        let sinks = self.state.read().sinks.clone();
        self.dispatcher.dispatch(alert, &sinks).await
    }

    /// Delivers `alert` on a detached task.
    ///
    /// The fan-out order across sinks is unchanged; only the caller stops
    /// waiting for it. Handles of finished deliveries are pruned here.
    pub(super) fn spawn_dispatch(&self, alert: Alert) {
        let sinks = self.state.read().sinks.clone();
        let dispatcher = self.dispatcher.clone();
        let handle = tokio::spawn(async move { dispatcher.dispatch(&alert, &sinks).await });

        let mut deliveries = self.deliveries.lock();
        deliveries.retain(|pending| !pending.is_finished());
        deliveries.push(handle);
    }

    /// Waits for every delivery started by [`AlertManager::check_rules`] so far.
    ///
    /// Each sink call is bounded by the delivery timeout, so this returns once
    /// the slowest pending fan-out has finished or timed out.
    pub async fn wait_for_deliveries(&self) -> Vec<DispatchSummary> {
        let pending = std::mem::take(&mut *self.deliveries.lock());
        let mut summaries = Vec::with_capacity(pending.len());
        for handle in pending {
            match handle.await {
                Ok(summary) => summaries.push(summary),
                Err(e) => warn!(component = "alerting", error = %e, "alert delivery task failed"),
            }
        }
        summaries
    }

    // ========== Alert Management ==========

    /// Marks an alert resolved.
    ///
    /// Unknown and already-resolved IDs are accepted as no-ops. Returns `true`
    /// only when this call performed the transition.
    pub fn resolve_alert(&self, alert_id: &str) -> bool {
        let now = self.clock.now();
        let outcome = self.state.write().store.resolve(alert_id, now);

        match outcome {
            ResolveOutcome::Resolved => {
                info!(alert_id = %alert_id, "alert resolved");
                true
            }
            ResolveOutcome::AlreadyResolved => {
                debug!(alert_id = %alert_id, "alert already resolved");
                false
            }
            ResolveOutcome::NotFound => {
                debug!(alert_id = %alert_id, "resolve requested for unknown alert");
                false
            }
        }
    }

    /// All alerts, open and resolved, in the order they were opened.
    #[must_use]
    pub fn get_alerts(&self) -> Vec<Alert> {
        self.state.read().store.all()
    }

    /// Unresolved alerts in the order they were opened.
    #[must_use]
    pub fn get_active_alerts(&self) -> Vec<Alert> {
        self.state.read().store.active()
    }

    #[must_use]
    pub fn get_alert(&self, alert_id: &str) -> Option<Alert> {
        self.state.read().store.get(alert_id).cloned()
    }

    #[must_use]
    pub fn active_alert_count(&self) -> usize {
        self.state.read().store.active_count()
    }

    /// When [`AlertManager::check_rules`] last completed a pass.
    #[must_use]
    pub fn last_evaluation_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_evaluation_at
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

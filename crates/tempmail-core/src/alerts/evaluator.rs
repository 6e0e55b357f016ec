//! Alert rule evaluation and background monitoring.
//!
//! Evaluation runs one pass over the registered rules:
//!
//! 1. Rules still inside their cooldown are skipped without evaluating the predicate.
//! 2. The predicate runs with no lock held. Errors and panics are logged and the
//!    pass moves on to the next rule.
//! 3. A true predicate takes the write lock once to re-check the cooldown, look
//!    for an open alert for the rule (dedup), insert a new alert and stamp the
//!    cooldown. Doing all of this under one acquisition keeps concurrent passes
//!    from opening two alerts for the same rule.
//! 4. Newly opened alerts are handed to the sinks on a detached task after the
//!    lock is released, so a slow or hung sink never delays the remaining rules.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::{
    errors::AlertError,
    manager::{AlertManager, RuleEntry},
    types::{Alert, Rule},
};
use crate::{metrics, utils::panic_message};

impl AlertManager {
    /// Evaluates every registered rule once, in registration order.
    ///
    /// Returns the alerts opened by this pass. Their delivery has been started
    /// but not awaited; see [`AlertManager::wait_for_deliveries`].
    pub async fn check_rules(&self) -> Vec<Alert> {
        let now = self.clock.now();
        let due: Vec<Rule> = {
            let state = self.state.read();
            state
                .rules
                .iter()
                .filter(|entry| {
                    let due = entry.is_due(now);
                    if !due {
                        debug!(rule_id = %entry.rule.id, "rule is in cooldown period, skipping");
                    }
                    due
                })
                .map(|entry| entry.rule.clone())
                .collect()
        };

        let mut opened = Vec::new();
        for rule in due {
            match evaluate_condition(&rule) {
                Ok(true) => {
                    if let Some(alert) = self.open_alert(&rule) {
                        self.spawn_dispatch(alert.clone());
                        opened.push(alert);
                    }
                }
                Ok(false) => {
                    debug!(rule_id = %rule.id, "rule condition not met");
                }
                Err(e) => {
                    warn!(rule_id = %rule.id, error = %e, "failed to evaluate rule condition");
                    metrics::record_rule_error(&rule.id);
                }
            }
        }

        self.state.write().last_evaluation_at = Some(self.clock.now());
        opened
    }

    /// Opens an alert for `rule` unless it is cooling down or already open.
    fn open_alert(&self, rule: &Rule) -> Option<Alert> {
        let now = self.clock.now();
        let mut state = self.state.write();
        let super::manager::AlertState { rules, store, .. } = &mut *state;

        let entry: &mut RuleEntry = rules.iter_mut().find(|entry| entry.rule.id == rule.id)?;
        if !entry.is_due(now) {
            debug!(rule_id = %rule.id, "rule fired concurrently, skipping");
            return None;
        }
        if let Some(open) = store.open_alert_for(&rule.id) {
            debug!(rule_id = %rule.id, alert_id = %open.id, "alert already open for rule");
            return None;
        }

        let alert = Alert::from_rule(&entry.rule, entry.epoch + 1, now);
        if !store.insert(alert.clone()) {
            error!(rule_id = %rule.id, alert_id = %alert.id, "alert id collision, skipping");
            return None;
        }
        entry.epoch += 1;
        entry.last_triggered_at = Some(now);

        info!(
            alert_id = %alert.id,
            rule_id = %rule.id,
            level = %alert.level,
            component = %alert.component,
            "alert opened"
        );
        metrics::record_alert_opened(&rule.id, alert.level);
        Some(alert)
    }

    /// Starts the background evaluation task.
    ///
    /// Runs [`AlertManager::check_rules`] every `interval` until `shutdown_rx`
    /// fires. Shutdown is observed between passes and wins over an overdue
    /// tick; a pass in progress finishes.
    #[must_use]
    pub fn start_monitoring(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_seconds = interval.as_secs(), "starting alert evaluator background task");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.recv() => {
                        info!("alert evaluator shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let opened = self.check_rules().await;
                        if !opened.is_empty() {
                            debug!(count = opened.len(), "evaluation pass opened alerts");
                        }
                    }
                }
            }
        })
    }
}

/// Runs a rule predicate, converting errors and panics into [`AlertError`].
fn evaluate_condition(rule: &Rule) -> Result<bool, AlertError> {
    match catch_unwind(AssertUnwindSafe(|| rule.evaluate())) {
        Ok(Ok(triggered)) => Ok(triggered),
        Ok(Err(e)) => {
            Err(AlertError::RuleEvaluation { rule_id: rule.id.clone(), message: e.to_string() })
        }
        Err(payload) => Err(AlertError::RulePanicked {
            rule_id: rule.id.clone(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

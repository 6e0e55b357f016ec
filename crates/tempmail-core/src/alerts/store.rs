//! In-memory alert table.
//!
//! The store is plain data; [`super::AlertManager`] wraps it in its lock. Alerts
//! are never removed, so positions in `alerts` are stable and can be indexed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::types::Alert;

/// Result of a resolve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The alert was open and is now resolved.
    Resolved,
    /// The alert was already resolved; nothing changed.
    AlreadyResolved,
    /// No alert has this ID; nothing changed.
    NotFound,
}

/// Alerts in insertion order, indexed by alert ID and by open rule.
#[derive(Debug, Default)]
pub struct AlertStore {
    alerts: Vec<Alert>,
    by_id: HashMap<String, usize>,
    /// At most one entry per rule: the position of its unresolved alert.
    open_by_rule: HashMap<String, usize>,
}

impl AlertStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unresolved alert for `rule_id`, if any.
    #[must_use]
    pub fn open_alert_for(&self, rule_id: &str) -> Option<&Alert> {
        self.open_by_rule.get(rule_id).map(|&idx| &self.alerts[idx])
    }

    /// Inserts a new open alert.
    ///
    /// Returns `false` and leaves the store untouched if the rule already has an
    /// open alert or the ID is taken.
    pub fn insert(&mut self, alert: Alert) -> bool {
        if self.open_by_rule.contains_key(&alert.rule_id) || self.by_id.contains_key(&alert.id) {
            return false;
        }

        let idx = self.alerts.len();
        self.by_id.insert(alert.id.clone(), idx);
        if !alert.resolved {
            self.open_by_rule.insert(alert.rule_id.clone(), idx);
        }
        self.alerts.push(alert);
        true
    }

    /// Resolves the alert with `alert_id`.
    pub fn resolve(&mut self, alert_id: &str, at: DateTime<Utc>) -> ResolveOutcome {
        let Some(&idx) = self.by_id.get(alert_id) else {
            return ResolveOutcome::NotFound;
        };

        let alert = &mut self.alerts[idx];
        if !alert.resolve(at) {
            return ResolveOutcome::AlreadyResolved;
        }

        if self.open_by_rule.get(&alert.rule_id) == Some(&idx) {
            self.open_by_rule.remove(&alert.rule_id);
        }
        ResolveOutcome::Resolved
    }

    #[must_use]
    pub fn get(&self, alert_id: &str) -> Option<&Alert> {
        self.by_id.get(alert_id).map(|&idx| &self.alerts[idx])
    }

    /// All alerts in the order they were opened.
    #[must_use]
    pub fn all(&self) -> Vec<Alert> {
        self.alerts.clone()
    }

    /// Unresolved alerts in the order they were opened.
    #[must_use]
    pub fn active(&self) -> Vec<Alert> {
        self.alerts.iter().filter(|a| !a.resolved).cloned().collect()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.open_by_rule.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

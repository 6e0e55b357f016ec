//! Alert type definitions.

use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level of an alert, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Informational alert for awareness.
    Info,
    /// Warning alert indicating potential issues.
    Warning,
    /// Critical alert requiring immediate attention.
    Critical,
}

impl AlertLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a rule predicate.
pub type ConditionResult = Result<bool, Box<dyn std::error::Error + Send + Sync>>;

type Condition = dyn Fn() -> ConditionResult + Send + Sync;

/// Default minimum interval between two firings of the same rule.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// A named predicate that opens an alert when it evaluates to `true`.
///
/// Predicates are plain closures and may capture any signal source. They run
/// outside the alert manager's lock, so they are free to block briefly.
#[derive(Clone)]
pub struct Rule {
    /// Unique identifier for the rule.
    pub id: String,
    /// Human-readable name, used as the alert title.
    pub name: String,
    /// Severity for alerts created by this rule.
    pub level: AlertLevel,
    /// Component the rule watches (e.g. `"storage"`).
    pub component: String,
    /// Message copied onto every alert this rule opens.
    pub message: String,
    /// Minimum time between consecutive firings.
    pub cooldown: Duration,
    condition: Arc<Condition>,
}

impl Rule {
    /// Creates a rule from an infallible predicate.
    ///
    /// Defaults: warning level, `"system"` component, the name as message and
    /// a five minute cooldown.
    #[must_use]
    pub fn new<F>(id: impl Into<String>, name: impl Into<String>, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::fallible(id, name, move || Ok(condition()))
    }

    /// Creates a rule from a predicate that may fail.
    ///
    /// A failing predicate is logged as an evaluation error and never opens an alert.
    #[must_use]
    pub fn fallible<F>(id: impl Into<String>, name: impl Into<String>, condition: F) -> Self
    where
        F: Fn() -> ConditionResult + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            id: id.into(),
            message: name.clone(),
            name,
            level: AlertLevel::Warning,
            component: "system".to_string(),
            cooldown: DEFAULT_COOLDOWN,
            condition: Arc::new(condition),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: AlertLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Evaluates the predicate.
    ///
    /// # Errors
    ///
    /// Returns whatever error the predicate produced.
    pub fn evaluate(&self) -> ConditionResult {
        (self.condition)()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("level", &self.level)
            .field("component", &self.component)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Evaluator-owned bookkeeping for a registered rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleState {
    pub id: String,
    pub name: String,
    pub level: AlertLevel,
    pub component: String,
    pub cooldown_seconds: u64,
    /// When the rule last opened an alert.
    pub last_triggered_at: Option<DateTime<Utc>>,
    /// Number of alerts the rule has opened so far.
    pub alerts_opened: u64,
}

/// A record of a rule having fired.
///
/// Serialized for sinks and the HTTP surface only. The owning rule id is
/// carried in JSON through `metadata.rule_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// `"{rule_id}-{epoch}"`; unique per open/resolve cycle.
    pub id: String,
    #[serde(skip)]
    pub rule_id: String,
    pub title: String,
    pub message: String,
    pub level: AlertLevel,
    pub component: String,
    #[serde(rename = "timestamp")]
    pub triggered_at: DateTime<Utc>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Alert {
    /// Builds the `epoch`-th alert for `rule`.
    #[must_use]
    pub fn from_rule(rule: &Rule, epoch: u64, triggered_at: DateTime<Utc>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("rule_id".to_string(), serde_json::Value::from(rule.id.clone()));
        metadata.insert("rule_name".to_string(), serde_json::Value::from(rule.name.clone()));
        metadata.insert("epoch".to_string(), serde_json::Value::from(epoch));

        Self {
            id: format!("{}-{epoch}", rule.id),
            rule_id: rule.id.clone(),
            title: rule.name.clone(),
            message: rule.message.clone(),
            level: rule.level,
            component: rule.component.clone(),
            triggered_at,
            resolved: false,
            resolved_at: None,
            metadata,
        }
    }

    /// Marks the alert as resolved. Returns `false` if it already was.
    pub fn resolve(&mut self, at: DateTime<Utc>) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        self.resolved_at = Some(at);
        true
    }
}

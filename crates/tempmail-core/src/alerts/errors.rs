use thiserror::Error;

/// Errors raised by the alert manager.
///
/// Registration errors are returned to the caller. Evaluation errors are only
/// logged; they exist as values so the evaluator can report them uniformly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AlertError {
    /// A rule with this ID is already registered.
    #[error("duplicate rule id: {0}")]
    DuplicateRuleId(String),

    /// Rule IDs must not be empty.
    #[error("rule id must not be empty")]
    EmptyRuleId,

    /// The cooldown cannot be represented as a timestamp offset.
    #[error("invalid cooldown for rule {rule_id}: {reason}")]
    InvalidCooldown { rule_id: String, reason: String },

    /// The rule predicate returned an error.
    #[error("rule {rule_id} failed to evaluate: {message}")]
    RuleEvaluation { rule_id: String, message: String },

    /// The rule predicate panicked.
    #[error("rule {rule_id} panicked: {message}")]
    RulePanicked { rule_id: String, message: String },
}

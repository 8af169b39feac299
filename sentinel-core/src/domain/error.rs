// sentinel-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    /// Malformed rule or constraint definition. Fatal: raised before any check runs.
    #[error("Configuration Error: {0}")]
    #[diagnostic(
        code(sentinel::domain::configuration),
        help("Check the rule catalog (config/rules.yml): patterns, thresholds and relationships.")
    )]
    Configuration(String),

    /// The uniqueness oracle could not answer. Degrades a single uniqueness check.
    #[error("Uniqueness oracle unavailable: {0}")]
    #[diagnostic(code(sentinel::domain::oracle))]
    OracleUnavailable(String),

    /// A single rule failed to evaluate. Surfaces as that rule's status only.
    #[error("Rule '{rule}' failed to execute: {reason}")]
    #[diagnostic(code(sentinel::domain::rule_execution))]
    RuleExecution { rule: String, reason: String },

    #[error("Circular dependency detected involving: {0}")]
    #[diagnostic(
        code(sentinel::domain::cycle),
        help("Foreign key relationships must form an acyclic graph.")
    )]
    CircularDependency(String),

    #[error("Invalid snapshot: {0}")]
    #[diagnostic(code(sentinel::domain::snapshot))]
    InvalidSnapshot(String),
}

impl DomainError {
    pub fn rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::RuleExecution {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

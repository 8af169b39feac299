// sentinel-core/src/domain/checks/mod.rs

pub mod issue;
pub mod result;
pub mod rule_set;
pub mod rules;

pub use issue::{AuthBreakdown, CustomerDayViolation, Issue, Sample, SubtypeViolation};
pub use result::{CheckResult, CheckStatus, FailingRows};
pub use rule_set::{RuleEntry, RuleSet};

use async_trait::async_trait;

use crate::domain::dataset::Snapshot;
use crate::domain::error::DomainError;

/// How many invalid values / violations are kept as evidence per issue.
/// Only limits reporting; failing row sets are always complete.
pub const SAMPLE_LIMIT: usize = 5;

/// One entry of the rule catalog.
///
/// A rule reads the shared snapshot and returns its own result. Missing input
/// is reported as a SKIP result, never as an error. An `Err` means the rule
/// itself broke; the runner turns it into a SKIP for that rule alone.
#[async_trait]
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;

    /// Human-readable statement of what the rule enforces.
    fn requirement(&self) -> String;

    async fn evaluate(&self, snapshot: &Snapshot) -> Result<CheckResult, DomainError>;
}

/// `part / whole` as a percentage rounded to two decimals. Zero when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 10_000.0).round() / 100.0
}

/// Complement of `percentage`, 100 when nothing was in scope.
pub fn compliance_rate(violations: usize, in_scope: usize) -> f64 {
    if in_scope == 0 {
        return 100.0;
    }
    ((1.0 - violations as f64 / in_scope as f64) * 10_000.0).round() / 100.0
}

// sentinel-core/src/application/audit.rs

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::join_all;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, instrument};

use crate::application::clean::CleaningSummary;
use crate::domain::checks::{CheckResult, CheckStatus, RuleEntry, RuleSet, percentage};
use crate::domain::dataset::Snapshot;

/// Outcome of one audit run over one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub audit_timestamp: DateTime<Utc>,
    pub overall_status: CheckStatus,
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub skipped_checks: usize,
    pub pass_rate: f64,
    pub tables_analyzed: Vec<String>,
    pub total_records_analyzed: usize,
    pub checks: Vec<CheckResult>,
    /// Attached once the cleaner has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningSummary>,
}

impl AuditReport {
    /// Builds the report from the per-check results. The overall status is FAIL
    /// iff a check failed; skipped checks never count against it.
    pub fn from_results(snapshot: &Snapshot, checks: Vec<CheckResult>) -> Self {
        let count = |s: CheckStatus| checks.iter().filter(|c| c.status == s).count();
        let passed = count(CheckStatus::Pass);
        let failed = count(CheckStatus::Fail);
        let skipped = count(CheckStatus::Skip);

        Self {
            audit_timestamp: Utc::now(),
            overall_status: if failed > 0 {
                CheckStatus::Fail
            } else {
                CheckStatus::Pass
            },
            total_checks: checks.len(),
            passed_checks: passed,
            failed_checks: failed,
            skipped_checks: skipped,
            pass_rate: percentage(passed, checks.len()),
            tables_analyzed: snapshot.table_names(),
            total_records_analyzed: snapshot.total_records(),
            checks,
            cleaning: None,
        }
    }

    pub fn with_cleaning(mut self, cleaning: CleaningSummary) -> Self {
        self.cleaning = Some(cleaning);
        self
    }

    pub fn check(&self, check_id: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.check_id == check_id)
    }

    pub fn is_fail(&self) -> bool {
        self.overall_status == CheckStatus::Fail
    }
}

/// Runs one rule with its failures contained: an error or a panic becomes a
/// SKIP result carrying the error text.
async fn run_contained(entry: &RuleEntry, snapshot: &Snapshot) -> CheckResult {
    let rule = entry.rule.as_ref();
    let outcome = AssertUnwindSafe(rule.evaluate(snapshot))
        .catch_unwind()
        .await;

    let mut result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!(check = rule.id(), error = %e, "Rule failed to execute");
            CheckResult::errored(rule.id(), rule.requirement(), e.to_string())
        }
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(check = rule.id(), reason = %reason, "Rule panicked");
            CheckResult::errored(rule.id(), rule.requirement(), format!("panic: {}", reason))
        }
    };
    result.feeds_cleaning = entry.feeds_cleaning;
    info!(check = %result.check_id, status = %result.status, "Check completed");
    result
}

/// Check Runner: evaluates every rule concurrently against the same snapshot.
/// Results come back in catalog order whatever the completion order.
#[instrument(skip_all, fields(rules = rules.len(), tables = snapshot.table_names().len()))]
pub async fn run_audit(snapshot: &Snapshot, rules: &RuleSet) -> AuditReport {
    let results = join_all(
        rules
            .entries()
            .iter()
            .map(|entry| run_contained(entry, snapshot)),
    )
    .await;

    let report = AuditReport::from_results(snapshot, results);
    info!(
        status = %report.overall_status,
        passed = report.passed_checks,
        failed = report.failed_checks,
        skipped = report.skipped_checks,
        "Audit finished"
    );
    report
}

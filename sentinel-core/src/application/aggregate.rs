// sentinel-core/src/application/aggregate.rs

use tracing::{debug, info};

use crate::application::audit::AuditReport;
use crate::domain::checks::{CheckResult, FailingRows};

/// Failure Aggregator: per table, the set union of the failing rows of every
/// FAIL check that feeds cleaning. A row flagged by several checks counts once.
pub fn aggregate_failures<'a>(checks: impl IntoIterator<Item = &'a CheckResult>) -> FailingRows {
    let mut aggregated = FailingRows::new();
    for check in checks {
        if !check.is_fail() {
            continue;
        }
        if !check.feeds_cleaning {
            debug!(check = %check.check_id, "Informational check, rows kept");
            continue;
        }
        aggregated.union_with(&check.failing_rows);
    }
    for (table, rows) in aggregated.iter() {
        info!(table = %table, rows = rows.len(), "Failing rows aggregated");
    }
    aggregated
}

pub fn aggregate_report(report: &AuditReport) -> FailingRows {
    aggregate_failures(&report.checks)
}

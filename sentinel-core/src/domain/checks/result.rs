// sentinel-core/src/domain/checks/result.rs

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::issue::Issue;
use crate::domain::dataset::RowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skip => "SKIP",
        };
        write!(f, "{}", s)
    }
}

/// Per-table sets of failing row ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FailingRows(BTreeMap<String, BTreeSet<RowId>>);

impl FailingRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: &str, row: RowId) {
        self.0.entry(table.to_string()).or_default().insert(row);
    }

    /// Adds rows to a table's set. No entry is created for an empty iterator.
    pub fn extend(&mut self, table: &str, rows: impl IntoIterator<Item = RowId>) {
        for row in rows {
            self.insert(table, row);
        }
    }

    /// Set union with `other`, table by table.
    pub fn union_with(&mut self, other: &FailingRows) {
        for (table, rows) in &other.0 {
            self.extend(table, rows.iter().copied());
        }
    }

    pub fn get(&self, table: &str) -> Option<&BTreeSet<RowId>> {
        self.0.get(table)
    }

    /// Number of failing rows for one table.
    pub fn count(&self, table: &str) -> usize {
        self.get(table).map_or(0, |s| s.len())
    }

    pub fn tables(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<RowId>)> {
        self.0.iter()
    }

    pub fn total(&self) -> usize {
        self.0.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|s| s.is_empty())
    }
}

impl<S: Into<String>> FromIterator<(S, BTreeSet<RowId>)> for FailingRows {
    fn from_iter<I: IntoIterator<Item = (S, BTreeSet<RowId>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(t, rows)| (t.into(), rows))
                .filter(|(_, rows)| !rows.is_empty())
                .collect(),
        )
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub check_id: String,
    pub requirement: String,
    pub status: CheckStatus,
    pub issues: Vec<Issue>,
    pub failing_rows: FailingRows,
    pub summary: BTreeMap<String, serde_json::Value>,
    /// Whether this check's failing rows are removed by the cleaner.
    pub feeds_cleaning: bool,
    /// Set when part of the check could not run (e.g. the uniqueness oracle failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    /// Builds a result whose status follows the evidence: FAIL iff any issue was raised.
    pub fn from_evidence(
        check_id: &str,
        requirement: String,
        issues: Vec<Issue>,
        failing_rows: FailingRows,
        summary: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        let status = if issues.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        };
        Self {
            check_id: check_id.to_string(),
            requirement,
            status,
            issues,
            failing_rows,
            summary,
            feeds_cleaning: true,
            degraded: None,
            skip_reason: None,
            error: None,
        }
    }

    pub fn skipped(check_id: &str, requirement: String, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut summary = BTreeMap::new();
        summary.insert("reason".to_string(), serde_json::Value::from(reason.clone()));
        Self {
            check_id: check_id.to_string(),
            requirement,
            status: CheckStatus::Skip,
            issues: vec![],
            failing_rows: FailingRows::new(),
            summary,
            feeds_cleaning: true,
            degraded: None,
            skip_reason: Some(reason),
            error: None,
        }
    }

    /// SKIP result for a rule that failed to execute.
    pub fn errored(check_id: &str, requirement: String, error: impl Into<String>) -> Self {
        let error = error.into();
        let mut result = Self::skipped(check_id, requirement, "Rule execution failed");
        result.error = Some(error);
        result
    }

    pub fn is_fail(&self) -> bool {
        self.status == CheckStatus::Fail
    }

    /// Sum of the violation counts carried by the issues.
    pub fn violation_count(&self) -> usize {
        self.issues.iter().map(|i| i.violation_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_counts_shared_rows_once() {
        let mut a = FailingRows::new();
        a.extend("customer", [RowId(1), RowId(2)]);
        let mut b = FailingRows::new();
        b.extend("customer", [RowId(2), RowId(3)]);
        b.insert("transaction", RowId(0));

        a.union_with(&b);
        assert_eq!(a.count("customer"), 3);
        assert_eq!(a.count("transaction"), 1);
        assert_eq!(a.total(), 4);
    }

    #[test]
    fn test_extend_with_nothing_creates_no_entry() {
        let mut rows = FailingRows::new();
        rows.extend("customer", std::iter::empty());
        assert!(rows.is_empty());
        assert_eq!(rows.tables().count(), 0);
    }

    #[test]
    fn test_status_follows_evidence() {
        let pass = CheckResult::from_evidence(
            "x",
            "req".into(),
            vec![],
            FailingRows::new(),
            BTreeMap::new(),
        );
        assert_eq!(pass.status, CheckStatus::Pass);

        let errored = CheckResult::errored("x", "req".into(), "boom");
        assert_eq!(errored.status, CheckStatus::Skip);
        assert_eq!(errored.error.as_deref(), Some("boom"));
    }
}

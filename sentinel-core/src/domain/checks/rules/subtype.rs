// sentinel-core/src/domain/checks/rules/subtype.rs

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;

use crate::domain::catalog::{SUBTYPE_CONSTRAINT_CHECK, SubtypeConstraintConfig};
use crate::domain::checks::{
    CheckResult, FailingRows, Issue, Rule, SubtypeViolation, percentage,
};
use crate::domain::dataset::Snapshot;
use crate::domain::error::DomainError;

/// Violations kept in the issue evidence.
const SUBTYPE_SAMPLE_LIMIT: usize = 10;

/// Each transaction subtype dictates which auxiliary fields are set and which stay null.
/// One violation per row, listing every missing and unexpected field.
pub struct SubtypeConstraintRule {
    config: SubtypeConstraintConfig,
}

impl SubtypeConstraintRule {
    pub fn new(config: SubtypeConstraintConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Rule for SubtypeConstraintRule {
    fn id(&self) -> &str {
        SUBTYPE_CONSTRAINT_CHECK
    }

    fn requirement(&self) -> String {
        let rules: Vec<String> = self
            .config
            .subtypes
            .iter()
            .map(|(name, f)| {
                format!(
                    "{} requires [{}] and forbids [{}]",
                    name,
                    f.required.join(", "),
                    f.forbidden.join(", ")
                )
            })
            .collect();
        format!("Transaction subtypes carry exactly their fields: {}", rules.join("; "))
    }

    async fn evaluate(&self, snapshot: &Snapshot) -> Result<CheckResult, DomainError> {
        let cfg = &self.config;
        let Some(table) = snapshot.table(&cfg.table) else {
            return Ok(CheckResult::skipped(
                self.id(),
                self.requirement(),
                format!("No {} data available", cfg.table),
            ));
        };

        let mut violations = Vec::new();
        let mut by_violation: BTreeMap<String, usize> = BTreeMap::new();
        let mut per_subtype: BTreeMap<String, usize> = BTreeMap::new();
        let mut failing = FailingRows::new();

        for (id, record) in table.rows() {
            let Some(kind) = record.get(&cfg.type_field).as_str() else {
                continue;
            };
            let Some(fields) = cfg.subtypes.get(kind) else {
                continue;
            };
            *per_subtype.entry(kind.to_string()).or_default() += 1;

            let missing: Vec<String> = fields
                .required
                .iter()
                .filter(|f| record.is_null(f))
                .cloned()
                .collect();
            let unexpected: Vec<String> = fields
                .forbidden
                .iter()
                .filter(|f| !record.is_null(f))
                .cloned()
                .collect();
            if missing.is_empty() && unexpected.is_empty() {
                continue;
            }

            for f in &missing {
                *by_violation
                    .entry(format!("{} requires {}", kind, f))
                    .or_default() += 1;
            }
            for f in &unexpected {
                *by_violation
                    .entry(format!("{} forbids {}", kind, f))
                    .or_default() += 1;
            }
            failing.insert(&cfg.table, id);
            violations.push(SubtypeViolation {
                row: id,
                transaction_type: kind.to_string(),
                missing_fields: missing,
                unexpected_fields: unexpected,
            });
        }

        let mut summary = BTreeMap::new();
        summary.insert("total_transactions".to_string(), json!(table.len()));
        summary.insert("checked_by_subtype".to_string(), json!(per_subtype));
        summary.insert(
            "constraint_violations".to_string(),
            json!(violations.len()),
        );

        let mut issues = Vec::new();
        if !violations.is_empty() {
            issues.push(Issue::SubtypeConstraints {
                table: cfg.table.clone(),
                violation_count: violations.len(),
                violation_percentage: percentage(violations.len(), table.len()),
                by_violation,
                samples: violations.into_iter().take(SUBTYPE_SAMPLE_LIMIT).collect(),
            });
        }

        Ok(CheckResult::from_evidence(
            self.id(),
            self.requirement(),
            issues,
            failing,
            summary,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::checks::CheckStatus;
    use crate::domain::dataset::{Record, RowId, Table};
    use anyhow::Result;

    #[tokio::test]
    async fn test_one_violation_per_row_with_all_fields() -> Result<()> {
        let snapshot = Snapshot::from_tables(vec![Table::new(
            "transaction",
            vec![
                // ok
                Record::new()
                    .with("transaction_type", "Internal_Transfer")
                    .with("recipient_account_number", "280100000000000009"),
                // bill payment with a destination and without bill reference
                Record::new()
                    .with("transaction_type", "Bill_Payment")
                    .with("recipient_account_number", "280100000000000009")
                    .with("service_provider_code", "EVN"),
                // external transfer missing the bank code
                Record::new()
                    .with("transaction_type", "External_Transfer")
                    .with("recipient_account_number", "1234"),
                // unknown subtype is not constrained
                Record::new().with("transaction_type", "Deposit"),
            ],
        )])?;

        let result = SubtypeConstraintRule::new(SubtypeConstraintConfig::default())
            .evaluate(&snapshot)
            .await?;

        assert_eq!(result.status, CheckStatus::Fail);
        let rows: Vec<_> = result
            .failing_rows
            .get("transaction")
            .unwrap()
            .iter()
            .copied()
            .collect();
        assert_eq!(rows, vec![RowId(1), RowId(2)]);

        let Issue::SubtypeConstraints {
            samples,
            by_violation,
            ..
        } = &result.issues[0]
        else {
            panic!("unexpected issue");
        };
        assert_eq!(samples[0].missing_fields, vec!["bill_number".to_string()]);
        assert_eq!(
            samples[0].unexpected_fields,
            vec!["recipient_account_number".to_string()]
        );
        assert_eq!(by_violation["External_Transfer requires recipient_bank_code"], 1);
        Ok(())
    }
}

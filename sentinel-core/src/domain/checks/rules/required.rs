// sentinel-core/src/domain/checks/rules/required.rs

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::catalog::REQUIRED_FIELDS_CHECK;
use crate::domain::checks::{CheckResult, FailingRows, Issue, Rule, percentage};
use crate::domain::dataset::Snapshot;
use crate::domain::error::DomainError;

/// Required fields must never be null.
pub struct RequiredFieldsRule {
    fields: BTreeMap<String, Vec<String>>,
}

impl RequiredFieldsRule {
    pub fn new(fields: BTreeMap<String, Vec<String>>) -> Self {
        Self { fields }
    }
}

#[async_trait]
impl Rule for RequiredFieldsRule {
    fn id(&self) -> &str {
        REQUIRED_FIELDS_CHECK
    }

    fn requirement(&self) -> String {
        "Required fields must not contain null or missing values".to_string()
    }

    async fn evaluate(&self, snapshot: &Snapshot) -> Result<CheckResult, DomainError> {
        let mut issues = Vec::new();
        let mut failing = FailingRows::new();
        let mut summary = BTreeMap::new();

        for (table_name, fields) in &self.fields {
            let Some(table) = snapshot.table(table_name) else {
                debug!(table = %table_name, "Table absent, required-field rule skipped");
                continue;
            };

            let mut table_issues = 0;
            for field in fields.iter().filter(|f| table.has_column(f)) {
                let nulls: Vec<_> = table
                    .rows()
                    .filter(|(_, r)| r.is_null(field))
                    .map(|(id, _)| id)
                    .collect();
                if nulls.is_empty() {
                    continue;
                }
                table_issues += 1;
                issues.push(Issue::NullValues {
                    table: table_name.clone(),
                    field: field.clone(),
                    null_count: nulls.len(),
                    total_records: table.len(),
                    null_percentage: percentage(nulls.len(), table.len()),
                });
                failing.extend(table_name, nulls);
            }

            summary.insert(
                table_name.clone(),
                json!({
                    "total_records": table.len(),
                    "issues_found": table_issues,
                    "failed_records": failing.count(table_name),
                }),
            );
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
    use crate::domain::dataset::{Record, Table, Value};
    use anyhow::Result;

    fn rule() -> RequiredFieldsRule {
        let mut fields = BTreeMap::new();
        fields.insert(
            "customer".to_string(),
            vec!["phone_number".to_string(), "full_name".to_string()],
        );
        fields.insert("missing_table".to_string(), vec!["x".to_string()]);
        RequiredFieldsRule::new(fields)
    }

    #[tokio::test]
    async fn test_failing_set_is_exactly_the_null_rows() -> Result<()> {
        let rows = (0..100)
            .map(|i| {
                let phone = if i % 20 == 0 {
                    Value::Null
                } else {
                    Value::from(format!("09{:08}", i))
                };
                Record::new()
                    .with("customer_id", format!("C{}", i))
                    .with("full_name", "Nguyen Van A")
                    .with("phone_number", phone)
            })
            .collect();
        let snapshot = Snapshot::from_tables(vec![Table::new("customer", rows)])?;

        let result = rule().evaluate(&snapshot).await?;

        assert_eq!(result.status, CheckStatus::Fail);
        let failing = result.failing_rows.get("customer").unwrap();
        assert_eq!(failing.len(), 5);
        let table = snapshot.table("customer").unwrap();
        for (id, record) in table.rows() {
            assert_eq!(failing.contains(&id), record.is_null("phone_number"));
        }
        assert_eq!(
            result.issues[0].describe(),
            "customer.phone_number: 5/100 failed (5.00% null)"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_absent_field_and_table_are_ignored() -> Result<()> {
        let snapshot = Snapshot::from_tables(vec![Table::new(
            "customer",
            vec![Record::new().with("phone_number", "0912345678")],
        )])?;

        let result = rule().evaluate(&snapshot).await?;

        assert_eq!(result.status, CheckStatus::Pass);
        assert!(result.failing_rows.is_empty());
        assert!(!result.summary.contains_key("missing_table"));
        assert_eq!(result.failing_rows.get("customer"), None);
        Ok(())
    }
}

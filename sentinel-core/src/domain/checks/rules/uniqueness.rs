// sentinel-core/src/domain/checks/rules/uniqueness.rs

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::catalog::UNIQUENESS_CHECK;
use crate::domain::checks::{CheckResult, FailingRows, Issue, Rule, SAMPLE_LIMIT};
use crate::domain::dataset::{RowId, Snapshot};
use crate::domain::error::DomainError;
use crate::domain::ports::UniquenessOracle;

/// Unique fields: no value may repeat inside the table, nor collide with a
/// value already committed in durable storage (when an oracle is available).
pub struct UniquenessRule {
    fields: BTreeMap<String, Vec<String>>,
    oracle: Option<Arc<dyn UniquenessOracle>>,
    timeout: Duration,
}

impl UniquenessRule {
    pub fn new(
        fields: BTreeMap<String, Vec<String>>,
        oracle: Option<Arc<dyn UniquenessOracle>>,
        timeout: Duration,
    ) -> Self {
        Self {
            fields,
            oracle,
            timeout,
        }
    }

    /// Committed values for one field. Any failure or timeout is turned into
    /// `OracleUnavailable` so the caller can degrade.
    async fn committed(
        &self,
        oracle: &dyn UniquenessOracle,
        table: &str,
        field: &str,
    ) -> Result<HashSet<String>, DomainError> {
        match tokio::time::timeout(self.timeout, oracle.existing_values(table, field)).await {
            Ok(Ok(values)) => Ok(values),
            Ok(Err(DomainError::OracleUnavailable(reason))) => {
                Err(DomainError::OracleUnavailable(reason))
            }
            Ok(Err(other)) => Err(DomainError::OracleUnavailable(other.to_string())),
            Err(_) => Err(DomainError::OracleUnavailable(format!(
                "no answer within {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl Rule for UniquenessRule {
    fn id(&self) -> &str {
        UNIQUENESS_CHECK
    }

    fn requirement(&self) -> String {
        "Identifier fields must be unique within the dataset and against committed data"
            .to_string()
    }

    async fn evaluate(&self, snapshot: &Snapshot) -> Result<CheckResult, DomainError> {
        let mut issues = Vec::new();
        let mut failing = FailingRows::new();
        let mut summary = BTreeMap::new();
        let mut degraded = Vec::new();
        let mut external_performed = self.oracle.is_some();

        for (table_name, fields) in &self.fields {
            let Some(table) = snapshot.table(table_name) else {
                continue;
            };

            for field in fields.iter().filter(|f| table.has_column(f)) {
                // value -> every row holding it, in row order
                let mut groups: BTreeMap<String, Vec<RowId>> = BTreeMap::new();
                for (id, value) in table.non_null(field) {
                    groups.entry(value.key()).or_default().push(id);
                }

                let internal: BTreeSet<RowId> = groups
                    .values()
                    .filter(|ids| ids.len() > 1)
                    .flatten()
                    .copied()
                    .collect();

                let mut external = BTreeSet::new();
                let mut conflicting_values: BTreeSet<&String> = groups
                    .iter()
                    .filter(|(_, ids)| ids.len() > 1)
                    .map(|(v, _)| v)
                    .collect();
                let mut field_external_performed = false;

                if let Some(oracle) = &self.oracle {
                    match self.committed(oracle.as_ref(), table_name, field).await {
                        Ok(committed) => {
                            field_external_performed = true;
                            for (value, ids) in &groups {
                                if committed.contains(value) {
                                    external.extend(ids.iter().copied());
                                    conflicting_values.insert(value);
                                }
                            }
                        }
                        Err(e) => {
                            warn!(
                                table = %table_name,
                                field = %field,
                                error = %e,
                                "⚠️ External uniqueness check not performed, falling back to internal duplicates"
                            );
                            external_performed = false;
                            degraded.push(format!(
                                "external check not performed for {}.{}: {}",
                                table_name, field, e
                            ));
                        }
                    }
                }

                let rows: BTreeSet<RowId> = internal.union(&external).copied().collect();
                debug!(
                    table = %table_name,
                    field = %field,
                    internal = internal.len(),
                    external = external.len(),
                    "Uniqueness evaluated"
                );
                if rows.is_empty() {
                    continue;
                }

                issues.push(Issue::Duplicates {
                    table: table_name.clone(),
                    field: field.clone(),
                    duplicate_count: rows.len(),
                    unique_count: groups.len(),
                    internal_duplicates: internal.len(),
                    external_conflicts: external.len(),
                    external_check_performed: field_external_performed,
                    sample_values: conflicting_values
                        .into_iter()
                        .take(SAMPLE_LIMIT)
                        .cloned()
                        .collect(),
                });
                failing.extend(table_name, rows);
            }

            summary.insert(
                table_name.clone(),
                json!({
                    "total_records": table.len(),
                    "failed_records": failing.count(table_name),
                }),
            );
        }

        summary.insert(
            "external_check_performed".to_string(),
            json!(external_performed),
        );

        let mut result = CheckResult::from_evidence(
            self.id(),
            self.requirement(),
            issues,
            failing,
            summary,
        );
        if !degraded.is_empty() {
            result.degraded = Some(degraded.join("; "));
        }
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::checks::CheckStatus;
    use crate::domain::dataset::{Record, Table};
    use anyhow::Result;

    struct FixedOracle(HashSet<String>);

    #[async_trait]
    impl UniquenessOracle for FixedOracle {
        async fn existing_values(
            &self,
            _table: &str,
            _field: &str,
        ) -> Result<HashSet<String>, DomainError> {
            Ok(self.0.clone())
        }
    }

    struct DownOracle;

    #[async_trait]
    impl UniquenessOracle for DownOracle {
        async fn existing_values(
            &self,
            _table: &str,
            _field: &str,
        ) -> Result<HashSet<String>, DomainError> {
            Err(DomainError::OracleUnavailable("connection refused".into()))
        }
    }

    struct SlowOracle;

    #[async_trait]
    impl UniquenessOracle for SlowOracle {
        async fn existing_values(
            &self,
            _table: &str,
            _field: &str,
        ) -> Result<HashSet<String>, DomainError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(HashSet::new())
        }
    }

    fn fields(table: &str, field: &str) -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        map.insert(table.to_string(), vec![field.to_string()]);
        map
    }

    fn accounts() -> Result<Snapshot> {
        Ok(Snapshot::from_tables(vec![Table::new(
            "bank_account",
            vec![
                Record::new().with("account_number", "280100000000000001"),
                Record::new().with("account_number", "280100000000000002"),
                Record::new().with("account_number", "280100000000000001"),
                Record::new().with("account_number", crate::domain::dataset::Value::Null),
            ],
        )])?)
    }

    fn emails() -> Result<Snapshot> {
        Ok(Snapshot::from_tables(vec![Table::new(
            "customer",
            vec![
                Record::new().with("email", "a@example.com"),
                Record::new().with("email", "b@example.com"),
                Record::new().with("email", "a@example.com"),
            ],
        )])?)
    }

    #[tokio::test]
    async fn test_all_duplicate_occurrences_fail() -> Result<()> {
        let rule = UniquenessRule::new(
            fields("bank_account", "account_number"),
            None,
            Duration::from_secs(1),
        );
        let result = rule.evaluate(&accounts()?).await?;

        assert_eq!(result.status, CheckStatus::Fail);
        let failing = result.failing_rows.get("bank_account").unwrap();
        let expected: BTreeSet<RowId> = [RowId(0), RowId(2)].into_iter().collect();
        assert_eq!(failing, &expected);
        match &result.issues[0] {
            Issue::Duplicates {
                duplicate_count,
                unique_count,
                ..
            } => {
                assert_eq!(*duplicate_count, 2);
                assert_eq!(*unique_count, 2);
            }
            other => panic!("unexpected issue {:?}", other),
        }
        assert!(result.degraded.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_decimal_scale_counts_as_duplicate() -> Result<()> {
        let snapshot = Snapshot::from_tables(vec![Table::new(
            "bank_account",
            vec![
                Record::new().with("account_number", rust_decimal_macros::dec!(1001.50)),
                Record::new().with("account_number", rust_decimal_macros::dec!(1001.5)),
            ],
        )])?;
        let rule = UniquenessRule::new(
            fields("bank_account", "account_number"),
            Some(Arc::new(FixedOracle(HashSet::new()))),
            Duration::from_secs(1),
        );
        let result = rule.evaluate(&snapshot).await?;
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.failing_rows.count("bank_account"), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_external_conflicts_are_unioned() -> Result<()> {
        let committed: HashSet<String> = ["280100000000000002".to_string()].into();
        let rule = UniquenessRule::new(
            fields("bank_account", "account_number"),
            Some(Arc::new(FixedOracle(committed))),
            Duration::from_secs(1),
        );
        let result = rule.evaluate(&accounts()?).await?;

        assert_eq!(result.failing_rows.count("bank_account"), 3);
        assert_eq!(result.summary["external_check_performed"], json!(true));
        Ok(())
    }

    #[tokio::test]
    async fn test_oracle_down_degrades_to_internal_only() -> Result<()> {
        let rule = UniquenessRule::new(
            fields("customer", "email"),
            Some(Arc::new(DownOracle)),
            Duration::from_secs(1),
        );
        let result = rule.evaluate(&emails()?).await?;

        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.failing_rows.count("customer"), 2);
        assert_eq!(result.summary["external_check_performed"], json!(false));
        assert!(
            result
                .degraded
                .as_deref()
                .unwrap()
                .contains("external check not performed for customer.email")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_slow_oracle_times_out() -> Result<()> {
        let rule = UniquenessRule::new(
            fields("customer", "email"),
            Some(Arc::new(SlowOracle)),
            Duration::from_millis(20),
        );
        let result = rule.evaluate(&emails()?).await?;

        assert_eq!(result.failing_rows.count("customer"), 2);
        assert!(result.degraded.is_some());
        Ok(())
    }
}

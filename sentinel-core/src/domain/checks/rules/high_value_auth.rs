// sentinel-core/src/domain/checks/rules/high_value_auth.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;

use crate::domain::catalog::{HIGH_VALUE_AUTH_CHECK, HighValueAuthConfig};
use crate::domain::checks::issue::sample_of;
use crate::domain::checks::{
    AuthBreakdown, CheckResult, FailingRows, Issue, Rule, SAMPLE_LIMIT, compliance_rate,
    percentage,
};
use crate::domain::dataset::{Record, Snapshot};
use crate::domain::error::DomainError;

/// Transactions at or above the threshold must use a strong authentication method.
pub struct HighValueAuthRule {
    config: HighValueAuthConfig,
}

impl HighValueAuthRule {
    pub fn new(config: HighValueAuthConfig) -> Self {
        Self { config }
    }

    fn amount_of(&self, record: &Record) -> Option<Decimal> {
        record.get(&self.config.amount_field).as_decimal()
    }

    fn is_high_value(&self, record: &Record) -> bool {
        let cfg = &self.config;
        let in_currency = record.get(&cfg.currency_field).as_str() == Some(cfg.currency.as_str());
        let in_types = record
            .get(&cfg.type_field)
            .as_str()
            .is_some_and(|t| cfg.transaction_types.iter().any(|x| x == t));
        in_currency && in_types && self.amount_of(record).is_some_and(|a| a >= cfg.threshold)
    }

    fn is_strong(&self, record: &Record) -> bool {
        record
            .get(&self.config.auth_field)
            .as_str()
            .is_some_and(|m| self.config.strong_methods.iter().any(|s| s == m))
    }
}

#[async_trait]
impl Rule for HighValueAuthRule {
    fn id(&self) -> &str {
        HIGH_VALUE_AUTH_CHECK
    }

    fn requirement(&self) -> String {
        let cfg = &self.config;
        format!(
            "{} transactions of {} {} or more must use strong authentication ({})",
            cfg.transaction_types.join("/"),
            cfg.threshold,
            cfg.currency,
            cfg.strong_methods.join(" or ")
        )
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

        let mut high_value = 0;
        let mut violations = Vec::new();
        let mut samples = Vec::new();
        let mut groups: BTreeMap<(String, String), AuthBreakdown> = BTreeMap::new();

        for (id, record) in table.rows().filter(|(_, r)| self.is_high_value(r)) {
            high_value += 1;
            if self.is_strong(record) {
                continue;
            }
            violations.push(id);
            if samples.len() < SAMPLE_LIMIT {
                samples.push(sample_of(
                    record,
                    &[
                        "transaction_id",
                        cfg.type_field.as_str(),
                        cfg.amount_field.as_str(),
                        cfg.auth_field.as_str(),
                    ],
                ));
            }

            let method = record.get(&cfg.auth_field).to_string();
            let kind = record.get(&cfg.type_field).to_string();
            let amount = self.amount_of(record).unwrap_or_default();
            let entry = groups
                .entry((method.clone(), kind.clone()))
                .or_insert_with(|| AuthBreakdown {
                    authentication_method: method,
                    transaction_type: kind,
                    count: 0,
                    total_amount: Decimal::ZERO,
                    max_amount: amount,
                });
            entry.count += 1;
            entry.total_amount += amount;
            entry.max_amount = entry.max_amount.max(amount);
        }

        let mut issues = Vec::new();
        let mut failing = FailingRows::new();
        if !violations.is_empty() {
            issues.push(Issue::WeakHighValueAuth {
                table: cfg.table.clone(),
                violation_count: violations.len(),
                high_value_count: high_value,
                violation_percentage: percentage(violations.len(), high_value),
                breakdown: groups.into_values().collect(),
                samples,
            });
        }

        let mut summary = BTreeMap::new();
        summary.insert("total_transactions".to_string(), json!(table.len()));
        summary.insert("high_value_transactions".to_string(), json!(high_value));
        summary.insert("violations".to_string(), json!(violations.len()));
        summary.insert(
            "compliance_rate".to_string(),
            json!(compliance_rate(violations.len(), high_value)),
        );
        failing.extend(&cfg.table, violations);

        Ok(CheckResult::from_evidence(
            self.id(),
            self.requirement(),
            issues,
            failing,
            summary,
        ))
    }
}

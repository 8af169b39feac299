// sentinel-core/src/domain/checks/rules/daily_limit.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::domain::catalog::{DAILY_LIMIT_AUTH_CHECK, DailyLimitAuthConfig};
use crate::domain::checks::{
    CheckResult, CustomerDayViolation, FailingRows, Issue, Rule, SAMPLE_LIMIT, compliance_rate,
    percentage,
};
use crate::domain::dataset::value::parse_timestamp;
use crate::domain::dataset::{Record, Snapshot, Value};
use crate::domain::error::DomainError;

#[derive(Default)]
struct DayTotal {
    amount: Decimal,
    count: usize,
    strong: bool,
    methods: BTreeSet<String>,
}

fn day_of(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(raw) => parse_timestamp(raw).map(|ts| ts.date()),
        other => other.as_date(),
    }
}

/// Per (customer, day): once the qualifying total reaches the threshold, at
/// least one of that day's transactions must have used strong authentication.
///
/// Violations are customer-days; they are not mapped back onto transaction rows.
pub struct DailyLimitAuthRule {
    config: DailyLimitAuthConfig,
}

impl DailyLimitAuthRule {
    pub fn new(config: DailyLimitAuthConfig) -> Self {
        Self { config }
    }

    fn qualifies(&self, record: &Record) -> bool {
        let cfg = &self.config;
        record.get(&cfg.status_field).as_str() == Some(cfg.completed_status.as_str())
            && record.get(&cfg.currency_field).as_str() == Some(cfg.currency.as_str())
            && record
                .get(&cfg.type_field)
                .as_str()
                .is_some_and(|t| cfg.transaction_types.iter().any(|x| x == t))
    }
}

#[async_trait]
impl Rule for DailyLimitAuthRule {
    fn id(&self) -> &str {
        DAILY_LIMIT_AUTH_CHECK
    }

    fn requirement(&self) -> String {
        let cfg = &self.config;
        format!(
            "Customers whose completed transfers reach {} {} in a day must use strong authentication ({}) at least once that day",
            cfg.threshold,
            cfg.currency,
            cfg.strong_methods.join(" or ")
        )
    }

    async fn evaluate(&self, snapshot: &Snapshot) -> Result<CheckResult, DomainError> {
        let cfg = &self.config;
        let (Some(transactions), Some(accounts)) = (
            snapshot.table(&cfg.transaction_table),
            snapshot.table(&cfg.account_table),
        ) else {
            return Ok(CheckResult::skipped(
                self.id(),
                self.requirement(),
                format!(
                    "Missing {} or {} data",
                    cfg.transaction_table, cfg.account_table
                ),
            ));
        };

        // account key -> owning customer
        let owners: HashMap<String, String> = accounts
            .rows()
            .filter_map(|(_, r)| {
                let key = r.get(&cfg.account_key);
                let owner = r.get(&cfg.customer_field);
                (!key.is_null() && !owner.is_null()).then(|| (key.to_string(), owner.to_string()))
            })
            .collect();

        let mut days: BTreeMap<(String, NaiveDate), DayTotal> = BTreeMap::new();
        let mut unresolved = 0;
        for (_, record) in transactions.rows().filter(|(_, r)| self.qualifies(r)) {
            let Some(amount) = record.get(&cfg.amount_field).as_decimal() else {
                continue;
            };
            let owner = owners.get(&record.get(&cfg.account_field).to_string());
            let day = day_of(record.get(&cfg.timestamp_field));
            let (Some(owner), Some(day)) = (owner, day) else {
                unresolved += 1;
                continue;
            };

            let total = days.entry((owner.clone(), day)).or_default();
            total.amount += amount;
            total.count += 1;
            let method = record.get(&cfg.auth_field);
            if let Some(m) = method.as_str() {
                total.strong |= cfg.strong_methods.iter().any(|s| s == m);
            }
            total.methods.insert(method.to_string());
        }
        if unresolved > 0 {
            debug!(
                unresolved,
                "Transactions without a resolvable customer or day were left out"
            );
        }

        let high_volume: Vec<_> = days
            .iter()
            .filter(|(_, t)| t.amount >= cfg.threshold)
            .collect();
        let violations: Vec<CustomerDayViolation> = high_volume
            .iter()
            .filter(|(_, t)| !t.strong)
            .map(|((customer, date), t)| CustomerDayViolation {
                customer_id: customer.clone(),
                date: *date,
                total_amount: t.amount,
                transaction_count: t.count,
                methods_used: t.methods.iter().cloned().collect(),
            })
            .collect();

        let mut summary = BTreeMap::new();
        summary.insert("customer_days_analyzed".to_string(), json!(days.len()));
        summary.insert("high_volume_days".to_string(), json!(high_volume.len()));
        summary.insert("violation_days".to_string(), json!(violations.len()));
        summary.insert(
            "compliance_rate".to_string(),
            json!(compliance_rate(violations.len(), high_volume.len())),
        );

        let mut issues = Vec::new();
        if !violations.is_empty() {
            issues.push(Issue::DailyLimitWithoutStrongAuth {
                violation_count: violations.len(),
                high_volume_days: high_volume.len(),
                violation_percentage: percentage(violations.len(), high_volume.len()),
                samples: violations.into_iter().take(SAMPLE_LIMIT).collect(),
            });
        }

        Ok(CheckResult::from_evidence(
            self.id(),
            self.requirement(),
            issues,
            FailingRows::new(),
            summary,
        ))
    }
}

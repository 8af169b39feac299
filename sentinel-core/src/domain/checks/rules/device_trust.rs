// sentinel-core/src/domain/checks/rules/device_trust.rs

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;

use crate::domain::catalog::{DEVICE_TRUST_CHECK, DeviceTrustConfig};
use crate::domain::checks::issue::sample_of;
use crate::domain::checks::{CheckResult, FailingRows, Issue, Rule, SAMPLE_LIMIT, percentage};
use crate::domain::dataset::{Record, Snapshot};
use crate::domain::error::DomainError;

/// An active device must be trusted.
pub struct DeviceTrustRule {
    config: DeviceTrustConfig,
}

impl DeviceTrustRule {
    pub fn new(config: DeviceTrustConfig) -> Self {
        Self { config }
    }

    fn is_active(&self, record: &Record) -> bool {
        record.get(&self.config.status_field).as_str() == Some(self.config.active_status.as_str())
    }

    fn trust(&self, record: &Record) -> Option<bool> {
        record.get(&self.config.trusted_field).as_bool()
    }
}

#[async_trait]
impl Rule for DeviceTrustRule {
    fn id(&self) -> &str {
        DEVICE_TRUST_CHECK
    }

    fn requirement(&self) -> String {
        format!(
            "Devices with status '{}' must be verified as trusted",
            self.config.active_status
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

        let mut active = 0;
        let mut trusted = 0;
        let mut violations = Vec::new();
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut samples = Vec::new();

        for (id, record) in table.rows() {
            let is_active = self.is_active(record);
            if is_active {
                active += 1;
            }
            match self.trust(record) {
                Some(true) => trusted += 1,
                Some(false) if is_active => {
                    violations.push(id);
                    *by_type
                        .entry(record.get("device_type").to_string())
                        .or_default() += 1;
                    if samples.len() < SAMPLE_LIMIT {
                        samples.push(sample_of(
                            record,
                            &["device_identifier", "device_type", "customer_id"],
                        ));
                    }
                }
                _ => {}
            }
        }

        let mut issues = Vec::new();
        if !violations.is_empty() {
            issues.push(Issue::UntrustedActiveDevices {
                table: cfg.table.clone(),
                violation_count: violations.len(),
                violation_percentage: percentage(violations.len(), table.len()),
                by_device_type: by_type,
                samples,
            });
        }

        let mut summary = BTreeMap::new();
        summary.insert("total_devices".to_string(), json!(table.len()));
        summary.insert("active_devices".to_string(), json!(active));
        summary.insert("trusted_devices".to_string(), json!(trusted));
        summary.insert(
            "untrusted_active_devices".to_string(),
            json!(violations.len()),
        );
        summary.insert(
            "trust_rate".to_string(),
            json!(percentage(trusted, table.len())),
        );

        let mut failing = FailingRows::new();
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

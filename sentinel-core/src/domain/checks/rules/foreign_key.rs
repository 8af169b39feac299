// sentinel-core/src/domain/checks/rules/foreign_key.rs

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::domain::catalog::{FOREIGN_KEY_CHECK, ForeignKey};
use crate::domain::checks::{CheckResult, FailingRows, Issue, Rule, SAMPLE_LIMIT};
use crate::domain::dataset::{Snapshot, Table};
use crate::domain::error::DomainError;

/// Non-null key values of `field` (see `Value::key`).
pub(crate) fn key_set(table: &Table, field: &str) -> HashSet<String> {
    table.non_null(field).map(|(_, v)| v.key()).collect()
}

pub struct ForeignKeyRule {
    relationships: Vec<ForeignKey>,
}

impl ForeignKeyRule {
    pub fn new(relationships: Vec<ForeignKey>) -> Self {
        Self { relationships }
    }
}

#[async_trait]
impl Rule for ForeignKeyRule {
    fn id(&self) -> &str {
        FOREIGN_KEY_CHECK
    }

    fn requirement(&self) -> String {
        "Every foreign key must reference an existing parent record".to_string()
    }

    async fn evaluate(&self, snapshot: &Snapshot) -> Result<CheckResult, DomainError> {
        let mut issues = Vec::new();
        let mut failing = FailingRows::new();
        let mut checked = 0;
        let mut skipped = 0;
        let mut total_orphans = 0;

        for fk in &self.relationships {
            let (Some(child), Some(parent)) = (
                snapshot.table(&fk.child_table),
                snapshot.table(&fk.parent_table),
            ) else {
                skipped += 1;
                continue;
            };
            if !child.has_column(&fk.child_field) || !parent.has_column(&fk.parent_field) {
                debug!(relationship = %fk, "Field absent, relationship skipped");
                skipped += 1;
                continue;
            }
            checked += 1;

            let parent_keys = key_set(parent, &fk.parent_field);
            let mut orphans = Vec::new();
            let mut samples = BTreeSet::new();
            for (id, value) in child.non_null(&fk.child_field) {
                let key = value.key();
                if !parent_keys.contains(&key) {
                    orphans.push(id);
                    if samples.len() < SAMPLE_LIMIT {
                        samples.insert(key);
                    }
                }
            }
            if orphans.is_empty() {
                continue;
            }

            total_orphans += orphans.len();
            issues.push(Issue::Orphans {
                relationship: fk.to_string(),
                child_table: fk.child_table.clone(),
                parent_table: fk.parent_table.clone(),
                orphan_count: orphans.len(),
                sample_values: samples.into_iter().collect(),
            });
            failing.extend(&fk.child_table, orphans);
        }

        let mut summary = BTreeMap::new();
        summary.insert("relationships_checked".to_string(), json!(checked));
        summary.insert("relationships_skipped".to_string(), json!(skipped));
        summary.insert("total_orphans".to_string(), json!(total_orphans));

        Ok(CheckResult::from_evidence(
            self.id(),
            self.requirement(),
            issues,
            failing,
            summary,
        ))
    }
}

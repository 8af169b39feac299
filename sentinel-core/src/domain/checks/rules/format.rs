// sentinel-core/src/domain/checks/rules/format.rs

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::collections::BTreeMap;

use crate::domain::catalog::{FORMAT_CHECK, FormatBinding};
use crate::domain::checks::{CheckResult, FailingRows, Issue, Rule, SAMPLE_LIMIT, percentage};
use crate::domain::dataset::Snapshot;
use crate::domain::error::DomainError;

/// A format binding with its patterns compiled as full-match expressions.
#[derive(Debug, Clone)]
pub struct CompiledFormat {
    pub table: String,
    pub field: String,
    pub pattern_names: Vec<String>,
    regexes: Vec<Regex>,
}

impl CompiledFormat {
    /// Resolves the binding's pattern names against `patterns` and anchors each one.
    pub fn compile(
        binding: &FormatBinding,
        patterns: &BTreeMap<String, String>,
    ) -> Result<Self, DomainError> {
        if binding.patterns.is_empty() {
            return Err(DomainError::Configuration(format!(
                "Format binding {}.{} has no pattern",
                binding.table, binding.field
            )));
        }
        let mut regexes = Vec::with_capacity(binding.patterns.len());
        for name in &binding.patterns {
            let raw = patterns.get(name).ok_or_else(|| {
                DomainError::Configuration(format!("Unknown format pattern '{}'", name))
            })?;
            let regex = Regex::new(&format!("^(?:{})$", raw)).map_err(|e| {
                DomainError::Configuration(format!("Pattern '{}' does not compile: {}", name, e))
            })?;
            regexes.push(regex);
        }
        Ok(Self {
            table: binding.table.clone(),
            field: binding.field.clone(),
            pattern_names: binding.patterns.clone(),
            regexes,
        })
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.regexes.iter().any(|r| r.is_match(value))
    }
}

pub struct FormatRule {
    bindings: Vec<CompiledFormat>,
}

impl FormatRule {
    pub fn new(bindings: Vec<CompiledFormat>) -> Self {
        Self { bindings }
    }
}

#[async_trait]
impl Rule for FormatRule {
    fn id(&self) -> &str {
        FORMAT_CHECK
    }

    fn requirement(&self) -> String {
        "Identity documents, phone numbers, emails, account numbers and device identifiers must match their declared formats".to_string()
    }

    async fn evaluate(&self, snapshot: &Snapshot) -> Result<CheckResult, DomainError> {
        let mut issues = Vec::new();
        let mut failing = FailingRows::new();
        let mut summary = BTreeMap::new();

        for binding in &self.bindings {
            let Some(table) = snapshot.table(&binding.table) else {
                continue;
            };
            if !table.has_column(&binding.field) {
                continue;
            }

            let mut total = 0;
            let mut invalid = Vec::new();
            let mut samples = Vec::new();
            for (id, value) in table.non_null(&binding.field) {
                total += 1;
                let text = value.to_string();
                if !binding.accepts(&text) {
                    invalid.push(id);
                    if samples.len() < SAMPLE_LIMIT {
                        samples.push(text);
                    }
                }
            }

            summary.insert(
                format!("{}.{}", binding.table, binding.field),
                json!({
                    "total_non_null": total,
                    "invalid": invalid.len(),
                }),
            );
            if invalid.is_empty() {
                continue;
            }

            issues.push(Issue::InvalidFormat {
                table: binding.table.clone(),
                field: binding.field.clone(),
                invalid_count: invalid.len(),
                total_non_null: total,
                invalid_percentage: percentage(invalid.len(), total),
                expected_patterns: binding.pattern_names.clone(),
                sample_values: samples,
            });
            failing.extend(&binding.table, invalid);
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

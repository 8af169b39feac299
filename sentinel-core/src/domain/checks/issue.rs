// sentinel-core/src/domain/checks/issue.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::dataset::{Record, RowId, Value};

/// A handful of fields copied out of an offending record.
pub type Sample = BTreeMap<String, Value>;

pub(crate) fn sample_of(record: &Record, fields: &[&str]) -> Sample {
    fields
        .iter()
        .map(|f| (f.to_string(), record.get(f).clone()))
        .collect()
}

/// Structured evidence attached to a check result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    NullValues {
        table: String,
        field: String,
        null_count: usize,
        total_records: usize,
        null_percentage: f64,
    },
    Duplicates {
        table: String,
        field: String,
        /// Rows involved in any conflict (internal or external).
        duplicate_count: usize,
        unique_count: usize,
        internal_duplicates: usize,
        external_conflicts: usize,
        external_check_performed: bool,
        sample_values: Vec<String>,
    },
    InvalidFormat {
        table: String,
        field: String,
        invalid_count: usize,
        total_non_null: usize,
        invalid_percentage: f64,
        expected_patterns: Vec<String>,
        sample_values: Vec<String>,
    },
    Orphans {
        relationship: String,
        child_table: String,
        parent_table: String,
        orphan_count: usize,
        sample_values: Vec<String>,
    },
    WeakHighValueAuth {
        table: String,
        violation_count: usize,
        high_value_count: usize,
        violation_percentage: f64,
        breakdown: Vec<AuthBreakdown>,
        samples: Vec<Sample>,
    },
    UntrustedActiveDevices {
        table: String,
        violation_count: usize,
        violation_percentage: f64,
        by_device_type: BTreeMap<String, usize>,
        samples: Vec<Sample>,
    },
    DailyLimitWithoutStrongAuth {
        violation_count: usize,
        high_volume_days: usize,
        violation_percentage: f64,
        samples: Vec<CustomerDayViolation>,
    },
    SubtypeConstraints {
        table: String,
        violation_count: usize,
        violation_percentage: f64,
        by_violation: BTreeMap<String, usize>,
        samples: Vec<SubtypeViolation>,
    },
}

/// High-value violations grouped by (authentication method, transaction type).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthBreakdown {
    pub authentication_method: String,
    pub transaction_type: String,
    pub count: usize,
    pub total_amount: Decimal,
    pub max_amount: Decimal,
}

/// A customer-day over the daily threshold without any strong authentication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDayViolation {
    pub customer_id: String,
    pub date: NaiveDate,
    pub total_amount: Decimal,
    pub transaction_count: usize,
    pub methods_used: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtypeViolation {
    pub row: RowId,
    pub transaction_type: String,
    pub missing_fields: Vec<String>,
    pub unexpected_fields: Vec<String>,
}

impl Issue {
    /// Number of offending values/rows/customer-days this issue stands for.
    pub fn violation_count(&self) -> usize {
        match self {
            Issue::NullValues { null_count, .. } => *null_count,
            Issue::Duplicates {
                duplicate_count, ..
            } => *duplicate_count,
            Issue::InvalidFormat { invalid_count, .. } => *invalid_count,
            Issue::Orphans { orphan_count, .. } => *orphan_count,
            Issue::WeakHighValueAuth {
                violation_count, ..
            }
            | Issue::UntrustedActiveDevices {
                violation_count, ..
            }
            | Issue::DailyLimitWithoutStrongAuth {
                violation_count, ..
            }
            | Issue::SubtypeConstraints {
                violation_count, ..
            } => *violation_count,
        }
    }

    /// One-line description for the detailed log.
    pub fn describe(&self) -> String {
        match self {
            Issue::NullValues {
                table,
                field,
                null_count,
                total_records,
                null_percentage,
            } => format!(
                "{}.{}: {}/{} failed ({:.2}% null)",
                table, field, null_count, total_records, null_percentage
            ),
            Issue::Duplicates {
                table,
                field,
                duplicate_count,
                internal_duplicates,
                external_conflicts,
                external_check_performed,
                ..
            } => format!(
                "{}.{}: {} duplicated rows ({} internal, {} already committed{})",
                table,
                field,
                duplicate_count,
                internal_duplicates,
                external_conflicts,
                if *external_check_performed {
                    ""
                } else {
                    ", external check not performed"
                }
            ),
            Issue::InvalidFormat {
                table,
                field,
                invalid_count,
                total_non_null,
                invalid_percentage,
                expected_patterns,
                ..
            } => format!(
                "{}.{}: {}/{} invalid ({:.2}%), expected one of [{}]",
                table,
                field,
                invalid_count,
                total_non_null,
                invalid_percentage,
                expected_patterns.join(", ")
            ),
            Issue::Orphans {
                relationship,
                orphan_count,
                ..
            } => format!("{}: {} orphan rows", relationship, orphan_count),
            Issue::WeakHighValueAuth {
                table,
                violation_count,
                high_value_count,
                ..
            } => format!(
                "{}: {}/{} high-value rows without strong authentication",
                table, violation_count, high_value_count
            ),
            Issue::UntrustedActiveDevices {
                table,
                violation_count,
                ..
            } => format!("{}: {} active devices are not trusted", table, violation_count),
            Issue::DailyLimitWithoutStrongAuth {
                violation_count,
                high_volume_days,
                ..
            } => format!(
                "{}/{} high-volume customer-days without strong authentication",
                violation_count, high_volume_days
            ),
            Issue::SubtypeConstraints {
                table,
                violation_count,
                ..
            } => format!(
                "{}: {} rows break their subtype field constraints",
                table, violation_count
            ),
        }
    }
}

// sentinel-core/src/domain/catalog/configuration.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use super::relationship::{DependencyGraph, ForeignKey};
use crate::domain::dataset::ValueKind;
use crate::domain::error::DomainError;

// --- CHECK IDENTIFIERS ---

pub const REQUIRED_FIELDS_CHECK: &str = "null_missing_values";
pub const UNIQUENESS_CHECK: &str = "uniqueness_constraints";
pub const FORMAT_CHECK: &str = "format_validation";
pub const FOREIGN_KEY_CHECK: &str = "foreign_key_integrity";
pub const HIGH_VALUE_AUTH_CHECK: &str = "high_value_transaction_auth";
pub const DEVICE_TRUST_CHECK: &str = "device_verification_requirement";
pub const DAILY_LIMIT_AUTH_CHECK: &str = "daily_transaction_limit_auth";
pub const SUBTYPE_CONSTRAINT_CHECK: &str = "transaction_type_constraints";

/// Declarative rule catalog: every table/field/threshold the checks need.
/// Loaded from `config/rules.yml`; the default is the banking catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RuleCatalog {
    /// table -> fields that must not be null
    #[serde(default)]
    pub required_fields: BTreeMap<String, Vec<String>>,

    /// table -> fields whose non-null values must be unique
    #[serde(default)]
    pub unique_fields: BTreeMap<String, Vec<String>>,

    /// Named regular expressions referenced by `formats`.
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,

    #[validate(nested)]
    #[serde(default)]
    pub formats: Vec<FormatBinding>,

    /// Processed in declared order by the cascade.
    #[validate(nested)]
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_value_auth: Option<HighValueAuthConfig>,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_trust: Option<DeviceTrustConfig>,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit_auth: Option<DailyLimitAuthConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype_constraints: Option<SubtypeConstraintConfig>,

    /// Check ids whose violations are reported but never removed by the cleaner.
    #[serde(default = "default_informational")]
    pub informational: Vec<String>,

    /// table -> field -> declared type, used when loading untyped input.
    #[serde(default)]
    pub column_types: BTreeMap<String, BTreeMap<String, ValueKind>>,
}

fn default_informational() -> Vec<String> {
    vec![SUBTYPE_CONSTRAINT_CHECK.to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FormatBinding {
    #[validate(length(min = 1))]
    pub table: String,
    #[validate(length(min = 1))]
    pub field: String,
    /// Names from `RuleCatalog::patterns`; a value must fully match at least one.
    #[validate(length(min = 1, message = "A format binding needs at least one pattern"))]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HighValueAuthConfig {
    pub table: String,
    pub amount_field: String,
    pub currency_field: String,
    pub type_field: String,
    pub auth_field: String,
    #[validate(custom(function = "non_negative"))]
    pub threshold: Decimal,
    pub currency: String,
    #[validate(length(min = 1))]
    pub transaction_types: Vec<String>,
    #[validate(length(min = 1, message = "At least one strong method is required"))]
    pub strong_methods: Vec<String>,
}

impl Default for HighValueAuthConfig {
    fn default() -> Self {
        Self {
            table: "transaction".into(),
            amount_field: "amount".into(),
            currency_field: "currency".into(),
            type_field: "transaction_type".into(),
            auth_field: "authentication_method".into(),
            threshold: Decimal::new(1_000_000_000, 2),
            currency: "VND".into(),
            transaction_types: banking_transfer_types(),
            strong_methods: banking_strong_methods(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DeviceTrustConfig {
    #[validate(length(min = 1))]
    pub table: String,
    pub trusted_field: String,
    pub status_field: String,
    pub active_status: String,
}

impl Default for DeviceTrustConfig {
    fn default() -> Self {
        Self {
            table: "customer_device".into(),
            trusted_field: "is_trusted".into(),
            status_field: "status".into(),
            active_status: "Active".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DailyLimitAuthConfig {
    pub transaction_table: String,
    pub account_table: String,
    /// transaction.<account_field> joins account.<account_key>
    pub account_field: String,
    pub account_key: String,
    /// account.<customer_field> identifies the owning customer
    pub customer_field: String,
    pub amount_field: String,
    pub currency_field: String,
    pub type_field: String,
    pub auth_field: String,
    pub status_field: String,
    pub completed_status: String,
    pub timestamp_field: String,
    #[validate(custom(function = "non_negative"))]
    pub threshold: Decimal,
    pub currency: String,
    #[validate(length(min = 1))]
    pub transaction_types: Vec<String>,
    #[validate(length(min = 1, message = "At least one strong method is required"))]
    pub strong_methods: Vec<String>,
}

impl Default for DailyLimitAuthConfig {
    fn default() -> Self {
        Self {
            transaction_table: "transaction".into(),
            account_table: "bank_account".into(),
            account_field: "account_id".into(),
            account_key: "account_id".into(),
            customer_field: "customer_id".into(),
            amount_field: "amount".into(),
            currency_field: "currency".into(),
            type_field: "transaction_type".into(),
            auth_field: "authentication_method".into(),
            status_field: "status".into(),
            completed_status: "Completed".into(),
            timestamp_field: "created_at".into(),
            threshold: Decimal::new(2_000_000_000, 2),
            currency: "VND".into(),
            transaction_types: banking_transfer_types(),
            strong_methods: banking_strong_methods(),
        }
    }
}

/// Per-subtype presence constraints on auxiliary fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtypeConstraintConfig {
    pub table: String,
    pub type_field: String,
    pub subtypes: BTreeMap<String, SubtypeFields>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtypeFields {
    /// Fields that must be non-null for this subtype.
    #[serde(default)]
    pub required: Vec<String>,
    /// Fields that must be null for this subtype.
    #[serde(default)]
    pub forbidden: Vec<String>,
}

impl Default for SubtypeConstraintConfig {
    fn default() -> Self {
        let fields = |required: &[&str], forbidden: &[&str]| SubtypeFields {
            required: required.iter().map(|s| s.to_string()).collect(),
            forbidden: forbidden.iter().map(|s| s.to_string()).collect(),
        };
        let mut subtypes = BTreeMap::new();
        subtypes.insert(
            "Internal_Transfer".to_string(),
            fields(&["recipient_account_number"], &["recipient_bank_code"]),
        );
        subtypes.insert(
            "External_Transfer".to_string(),
            fields(&["recipient_account_number", "recipient_bank_code"], &[]),
        );
        subtypes.insert(
            "Bill_Payment".to_string(),
            fields(
                &["service_provider_code", "bill_number"],
                &["recipient_account_number", "recipient_bank_code"],
            ),
        );
        Self {
            table: "transaction".into(),
            type_field: "transaction_type".into(),
            subtypes,
        }
    }
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("negative_threshold"));
    }
    Ok(())
}

fn banking_transfer_types() -> Vec<String> {
    ["Internal_Transfer", "External_Transfer", "Bill_Payment"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn banking_strong_methods() -> Vec<String> {
    ["PIN_OTP", "PIN_OTP_Biometric"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn table_fields(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(t, fields)| (t.to_string(), fields.iter().map(|f| f.to_string()).collect()))
        .collect()
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::banking()
    }
}

impl RuleCatalog {
    /// An empty catalog: no check has anything to look at.
    pub fn empty() -> Self {
        Self {
            required_fields: BTreeMap::new(),
            unique_fields: BTreeMap::new(),
            patterns: BTreeMap::new(),
            formats: vec![],
            foreign_keys: vec![],
            high_value_auth: None,
            device_trust: None,
            daily_limit_auth: None,
            subtype_constraints: None,
            informational: default_informational(),
            column_types: BTreeMap::new(),
        }
    }

    /// Retail banking catalog: customers, accounts, devices, transactions, auth logs.
    pub fn banking() -> Self {
        let required_fields = table_fields(&[
            (
                "customer",
                &[
                    "full_name",
                    "date_of_birth",
                    "phone_number",
                    "id_passport_number",
                    "residential_address",
                    "pin",
                    "password",
                ],
            ),
            (
                "bank_account",
                &["customer_id", "account_number", "account_type", "currency"],
            ),
            (
                "transaction",
                &[
                    "account_id",
                    "transaction_type",
                    "amount",
                    "currency",
                    "authentication_method",
                ],
            ),
            (
                "customer_device",
                &["device_identifier", "customer_id", "device_type"],
            ),
            ("face_template", &["customer_id", "encrypted_face_encoding"]),
            (
                "authentication_log",
                &["customer_id", "device_identifier", "authentication_type", "status"],
            ),
        ]);

        let unique_fields = table_fields(&[
            (
                "customer",
                &[
                    "phone_number",
                    "email",
                    "tax_identification_number",
                    "id_passport_number",
                ],
            ),
            ("bank_account", &["account_number"]),
            ("customer_device", &["device_identifier"]),
            ("face_template", &["customer_id"]),
            ("transaction", &["transaction_id"]),
            ("authentication_log", &["log_id"]),
        ]);

        let patterns: BTreeMap<String, String> = [
            ("cccd_number", r"\d{12}"),
            ("passport_number", r"[A-Z]\d{7}"),
            ("vietnamese_phone", r"(09|08|07|05|03)\d{8}"),
            ("email", r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"),
            ("bvbank_account", r"280\d{15}"),
            ("device_identifier", r"(IMEI|MAC|UUID|ANDROID_ID):[A-Za-z0-9:-]+"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let binding = |table: &str, field: &str, names: &[&str]| FormatBinding {
            table: table.into(),
            field: field.into(),
            patterns: names.iter().map(|s| s.to_string()).collect(),
        };
        let formats = vec![
            binding(
                "customer",
                "id_passport_number",
                &["cccd_number", "passport_number"],
            ),
            binding("customer", "phone_number", &["vietnamese_phone"]),
            binding("customer", "email", &["email"]),
            binding("bank_account", "account_number", &["bvbank_account"]),
            binding("customer_device", "device_identifier", &["device_identifier"]),
        ];

        let foreign_keys = vec![
            ForeignKey::new("face_template", "customer_id", "customer", "customer_id"),
            ForeignKey::new("bank_account", "customer_id", "customer", "customer_id"),
            ForeignKey::new("customer_device", "customer_id", "customer", "customer_id"),
            ForeignKey::new("transaction", "account_id", "bank_account", "account_id"),
            ForeignKey::new("authentication_log", "customer_id", "customer", "customer_id"),
            ForeignKey::new("authentication_log", "transaction_id", "transaction", "transaction_id"),
            ForeignKey::new(
                "authentication_log",
                "device_identifier",
                "customer_device",
                "device_identifier",
            ),
        ];

        let kinds = |entries: &[(&str, ValueKind)]| -> BTreeMap<String, ValueKind> {
            entries.iter().map(|(f, k)| (f.to_string(), *k)).collect()
        };
        let mut column_types = BTreeMap::new();
        column_types.insert(
            "customer".to_string(),
            kinds(&[
                ("date_of_birth", ValueKind::Date),
                ("issue_date", ValueKind::Date),
                ("expiry_date", ValueKind::Date),
                ("monthly_income", ValueKind::Decimal),
                ("risk_score", ValueKind::Decimal),
                ("created_at", ValueKind::Timestamp),
                ("updated_at", ValueKind::Timestamp),
            ]),
        );
        column_types.insert(
            "bank_account".to_string(),
            kinds(&[
                ("available_balance", ValueKind::Decimal),
                ("current_balance", ValueKind::Decimal),
                ("hold_amount", ValueKind::Decimal),
                ("daily_transfer_limit", ValueKind::Decimal),
                ("daily_online_payment_limit", ValueKind::Decimal),
                ("interest_rate", ValueKind::Decimal),
                ("open_at", ValueKind::Timestamp),
            ]),
        );
        column_types.insert(
            "transaction".to_string(),
            kinds(&[
                ("amount", ValueKind::Decimal),
                ("fee", ValueKind::Decimal),
                ("fraud_score", ValueKind::Decimal),
                ("created_at", ValueKind::Timestamp),
                ("completed_at", ValueKind::Timestamp),
            ]),
        );
        column_types.insert(
            "customer_device".to_string(),
            kinds(&[
                ("first_seen_at", ValueKind::Timestamp),
                ("last_used_at", ValueKind::Timestamp),
            ]),
        );
        column_types.insert(
            "face_template".to_string(),
            kinds(&[
                ("encrypted_face_encoding", ValueKind::Bytes),
                ("created_at", ValueKind::Timestamp),
                ("last_used_at", ValueKind::Timestamp),
            ]),
        );
        column_types.insert(
            "authentication_log".to_string(),
            kinds(&[
                ("biometric_score", ValueKind::Decimal),
                ("created_at", ValueKind::Timestamp),
            ]),
        );

        Self {
            required_fields,
            unique_fields,
            patterns,
            formats,
            foreign_keys,
            high_value_auth: Some(HighValueAuthConfig::default()),
            device_trust: Some(DeviceTrustConfig::default()),
            daily_limit_auth: Some(DailyLimitAuthConfig::default()),
            subtype_constraints: Some(SubtypeConstraintConfig::default()),
            informational: default_informational(),
            column_types,
        }
    }

    /// Whether violations of `check_id` feed the cleaning set.
    pub fn feeds_cleaning(&self, check_id: &str) -> bool {
        !self.informational.iter().any(|c| c == check_id)
    }

    /// Every configured table name, in first-seen order.
    pub fn tables(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !seen.iter().any(|s| s == name) {
                seen.push(name.to_string());
            }
        };
        self.required_fields.keys().for_each(|t| push(t));
        self.unique_fields.keys().for_each(|t| push(t));
        self.formats.iter().for_each(|f| push(&f.table));
        for fk in &self.foreign_keys {
            push(&fk.parent_table);
            push(&fk.child_table);
        }
        seen
    }

    /// Structural validation. Any error here is fatal: no check may run
    /// against a malformed catalog.
    pub fn validate_catalog(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::Configuration(e.to_string()))?;

        for binding in &self.formats {
            for name in &binding.patterns {
                if !self.patterns.contains_key(name) {
                    return Err(DomainError::Configuration(format!(
                        "Format binding {}.{} references unknown pattern '{}'",
                        binding.table, binding.field, name
                    )));
                }
            }
        }

        for (table, fields) in self.required_fields.iter().chain(self.unique_fields.iter()) {
            if fields.iter().any(|f| f.trim().is_empty()) {
                return Err(DomainError::Configuration(format!(
                    "Empty field name declared for table '{}'",
                    table
                )));
            }
        }

        if let Some(subtypes) = &self.subtype_constraints {
            for (name, fields) in &subtypes.subtypes {
                if let Some(both) = fields.required.iter().find(|f| fields.forbidden.contains(*f)) {
                    return Err(DomainError::Configuration(format!(
                        "Subtype '{}' both requires and forbids '{}'",
                        name, both
                    )));
                }
            }
        }

        DependencyGraph::load_order(&[], &self.foreign_keys).map_err(|e| {
            DomainError::Configuration(format!("Foreign key graph is invalid: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rust_decimal_macros::dec;

    #[test]
    fn test_banking_catalog_is_valid() -> Result<()> {
        let catalog = RuleCatalog::banking();
        catalog.validate_catalog()?;
        assert_eq!(catalog.foreign_keys.len(), 7);
        assert!(!catalog.feeds_cleaning(SUBTYPE_CONSTRAINT_CHECK));
        assert!(catalog.feeds_cleaning(REQUIRED_FIELDS_CHECK));
        assert_eq!(
            catalog.high_value_auth.as_ref().unwrap().threshold,
            dec!(10000000.00)
        );
        Ok(())
    }

    #[test]
    fn test_unknown_pattern_is_configuration_error() {
        let mut catalog = RuleCatalog::banking();
        catalog.formats[0].patterns.push("does_not_exist".into());
        assert!(matches!(
            catalog.validate_catalog(),
            Err(DomainError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_pattern_set_is_rejected() {
        let mut catalog = RuleCatalog::banking();
        catalog.formats[0].patterns.clear();
        assert!(matches!(
            catalog.validate_catalog(),
            Err(DomainError::Configuration(_))
        ));
    }

    #[test]
    fn test_negative_threshold_is_rejected() {
        let mut catalog = RuleCatalog::banking();
        if let Some(cfg) = catalog.high_value_auth.as_mut() {
            cfg.threshold = dec!(-1);
        }
        assert!(matches!(
            catalog.validate_catalog(),
            Err(DomainError::Configuration(_))
        ));
    }

    #[test]
    fn test_fk_cycle_is_configuration_error() {
        let mut catalog = RuleCatalog::empty();
        catalog.foreign_keys = vec![
            ForeignKey::new("a", "b_id", "b", "id"),
            ForeignKey::new("b", "a_id", "a", "id"),
        ];
        assert!(matches!(
            catalog.validate_catalog(),
            Err(DomainError::Configuration(_))
        ));
    }

    #[test]
    fn test_yaml_partial_business_rule_uses_defaults() -> Result<()> {
        let yaml = r#"
required_fields:
  customer: [phone_number]
high_value_auth:
  threshold: "5000000"
"#;
        let catalog: RuleCatalog = serde_yaml::from_str(yaml)?;
        let hv = catalog.high_value_auth.unwrap();
        assert_eq!(hv.threshold, dec!(5000000));
        assert_eq!(hv.table, "transaction");
        assert!(catalog.device_trust.is_none());
        assert_eq!(catalog.informational, vec![SUBTYPE_CONSTRAINT_CHECK.to_string()]);
        Ok(())
    }
}

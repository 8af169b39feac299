// sentinel-core/src/test_support.rs

// Shared banking fixtures for unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::domain::catalog::RuleCatalog;
use crate::domain::dataset::{Record, Snapshot, Table, Value};
use crate::domain::error::DomainError;
use crate::domain::project::{CascadeMode, ProjectConfig};
use crate::error::SentinelError;
use crate::ports::DatasetProvider;

pub const BANKING_TABLES: [&str; 6] = [
    "customer",
    "bank_account",
    "customer_device",
    "transaction",
    "face_template",
    "authentication_log",
];

pub struct StaticProvider(pub Snapshot);

#[async_trait]
impl DatasetProvider for StaticProvider {
    async fn load(&self) -> Result<Snapshot, SentinelError> {
        Ok(self.0.clone())
    }

    fn source_name(&self) -> &str {
        "fixture"
    }
}

pub fn project_config() -> ProjectConfig {
    ProjectConfig {
        name: "fixture".into(),
        version: "1.0".into(),
        config_paths: vec!["config".into()],
        data_path: "data".into(),
        target_path: "target".into(),
        database: None,
        oracle_timeout_ms: 1_000,
        cascade: CascadeMode::SinglePass,
        expected_tables: BANKING_TABLES.iter().map(|t| t.to_string()).collect(),
        rules: RuleCatalog::banking(),
    }
}

fn day(y: i32, m: u32, d: u32) -> Value {
    NaiveDate::from_ymd_opt(y, m, d).map_or(Value::Null, Value::Date)
}

fn at(raw: &str) -> Value {
    crate::domain::dataset::value::parse_timestamp(raw).map_or(Value::Null, Value::Timestamp)
}

/// A valid customer, numbered so identifiers stay unique and well formed.
pub fn customer(i: usize) -> Record {
    Record::new()
        .with("customer_id", format!("C{}", i))
        .with("full_name", format!("Nguyen Van {}", i))
        .with("date_of_birth", day(1990, 1, 1 + (i % 28) as u32))
        .with("phone_number", format!("09{:08}", i))
        .with("email", format!("user{}@example.com", i))
        .with("id_passport_number", format!("{:012}", i))
        .with("tax_identification_number", format!("TIN{:07}", i))
        .with("residential_address", "12 Nguyen Hue, District 1")
        .with("pin", "hashed-pin")
        .with("password", "hashed-password")
}

pub fn account(i: usize, customer: usize) -> Record {
    Record::new()
        .with("account_id", format!("A{}", i))
        .with("customer_id", format!("C{}", customer))
        .with("account_number", format!("280{:015}", i))
        .with("account_type", "Savings")
        .with("currency", "VND")
}

pub fn device(i: usize, customer: usize, trusted: bool, status: &str) -> Record {
    Record::new()
        .with("device_identifier", format!("IMEI:35693803564{:04}", i))
        .with("customer_id", format!("C{}", customer))
        .with("device_type", "Mobile")
        .with("is_trusted", trusted)
        .with("status", status)
}

pub fn transaction(i: usize, account: usize, kind: &str, amount: Decimal, method: &str) -> Record {
    let record = Record::new()
        .with("transaction_id", format!("T{}", i))
        .with("account_id", format!("A{}", account))
        .with("transaction_type", kind)
        .with("amount", amount)
        .with("currency", "VND")
        .with("authentication_method", method)
        .with("status", "Completed")
        .with("created_at", at("2024-03-01T09:00:00"));
    match kind {
        "Internal_Transfer" => record.with("recipient_account_number", "280000000000000999"),
        "External_Transfer" => record
            .with("recipient_account_number", "0123456789")
            .with("recipient_bank_code", "VCB"),
        "Bill_Payment" => record
            .with("service_provider_code", "EVN")
            .with("bill_number", format!("B{}", i)),
        _ => record,
    }
}

pub fn face_template(i: usize, customer: usize) -> Record {
    Record::new()
        .with("template_id", format!("F{}", i))
        .with("customer_id", format!("C{}", customer))
        .with("encrypted_face_encoding", Value::Bytes(vec![1, 2, 3, 4]))
}

pub fn auth_log(i: usize, customer: usize, device: usize, transaction: Option<usize>) -> Record {
    Record::new()
        .with("log_id", format!("L{}", i))
        .with("customer_id", format!("C{}", customer))
        .with("device_identifier", format!("IMEI:35693803564{:04}", device))
        .with("transaction_id", transaction.map(|t| format!("T{}", t)))
        .with("authentication_type", "PIN_OTP")
        .with("status", "Success")
}

/// Three customers with accounts, devices, transactions, face templates and
/// logs. Every check passes on it as-is.
pub fn banking_tables() -> BTreeMap<&'static str, Vec<Record>> {
    let mut tables = BTreeMap::new();
    tables.insert("customer", (1..=3).map(customer).collect());
    tables.insert(
        "bank_account",
        vec![account(1, 1), account(2, 2), account(3, 3)],
    );
    tables.insert(
        "customer_device",
        vec![
            device(1, 1, true, "Active"),
            device(2, 2, true, "Active"),
            device(3, 3, false, "Blocked"),
        ],
    );
    tables.insert(
        "transaction",
        vec![
            transaction(1, 1, "Internal_Transfer", Decimal::new(500_000, 0), "PIN"),
            transaction(2, 2, "External_Transfer", Decimal::new(15_000_000, 0), "PIN_OTP"),
            transaction(3, 3, "Bill_Payment", Decimal::new(200_000, 0), "PIN"),
        ],
    );
    tables.insert("face_template", vec![face_template(1, 1), face_template(2, 2)]);
    tables.insert(
        "authentication_log",
        vec![auth_log(1, 1, 1, Some(1)), auth_log(2, 2, 2, Some(2))],
    );
    tables
}

pub fn snapshot_of(tables: BTreeMap<&'static str, Vec<Record>>) -> Result<Snapshot, DomainError> {
    Snapshot::from_tables(
        tables
            .into_iter()
            .map(|(name, rows)| Table::new(name, rows)),
    )
}

pub fn banking_snapshot() -> Result<Snapshot, DomainError> {
    snapshot_of(banking_tables())
}

// sentinel-core/src/application/scenarios.rs

// End-to-end behaviour of audit + aggregation + cleaning on banking data.

#![allow(clippy::unwrap_used)]

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::application::{aggregate_report, clean_dataset, run_audit};
use crate::domain::catalog::{
    DEVICE_TRUST_CHECK, FOREIGN_KEY_CHECK, HIGH_VALUE_AUTH_CHECK, REQUIRED_FIELDS_CHECK,
    RuleCatalog, SUBTYPE_CONSTRAINT_CHECK, UNIQUENESS_CHECK,
};
use crate::domain::checks::{CheckStatus, FailingRows, Issue, RuleSet};
use crate::domain::dataset::{RowId, Snapshot, Value};
use crate::domain::error::DomainError;
use crate::domain::ports::UniquenessOracle;
use crate::test_support::*;

fn banking_rules() -> Result<RuleSet> {
    Ok(RuleSet::compile(
        &RuleCatalog::banking(),
        None,
        Duration::from_secs(1),
    )?)
}

fn assert_fk_postcondition(cleaned: &Snapshot) {
    for fk in &RuleCatalog::banking().foreign_keys {
        let (Some(child), Some(parent)) = (
            cleaned.table(&fk.child_table),
            cleaned.table(&fk.parent_table),
        ) else {
            continue;
        };
        let keys: HashSet<String> = parent
            .non_null(&fk.parent_field)
            .map(|(_, v)| v.key())
            .collect();
        for (_, value) in child.non_null(&fk.child_field) {
            assert!(
                keys.contains(&value.key()),
                "{} still references missing {}",
                fk,
                value
            );
        }
    }
}

#[tokio::test]
async fn test_clean_fixture_passes_everything() -> Result<()> {
    let report = run_audit(&banking_snapshot()?, &banking_rules()?).await;
    let failed: Vec<_> = report
        .checks
        .iter()
        .filter(|c| c.status != CheckStatus::Pass)
        .map(|c| c.check_id.as_str())
        .collect();
    assert!(failed.is_empty(), "unexpected non-pass checks: {:?}", failed);
    assert_eq!(report.total_checks, 8);
    assert_eq!(report.total_records_analyzed, 16);
    Ok(())
}

#[tokio::test]
async fn test_null_phone_numbers_on_hundred_customers() -> Result<()> {
    let mut rows: Vec<_> = (1..=100).map(customer).collect();
    for i in [3, 17, 42, 64, 99] {
        rows[i].insert("phone_number", Value::Null);
    }
    let mut tables = std::collections::BTreeMap::new();
    tables.insert("customer", rows);
    let snapshot = snapshot_of(tables)?;

    let report = run_audit(&snapshot, &banking_rules()?).await;
    let check = report.check(REQUIRED_FIELDS_CHECK).unwrap();

    assert_eq!(check.status, CheckStatus::Fail);
    assert_eq!(check.failing_rows.count("customer"), 5);
    assert!(check.failing_rows.get("customer").unwrap().contains(&RowId(42)));
    assert_eq!(
        check.issues[0].describe(),
        "customer.phone_number: 5/100 failed (5.00% null)"
    );
    Ok(())
}

#[tokio::test]
async fn test_shared_account_number_flags_both_rows() -> Result<()> {
    let mut tables = banking_tables();
    let accounts = tables.get_mut("bank_account").unwrap();
    accounts[0].insert("account_number", Value::from("280100000000000001"));
    accounts[2].insert("account_number", Value::from("280100000000000001"));
    let snapshot = snapshot_of(tables)?;

    let report = run_audit(&snapshot, &banking_rules()?).await;
    let check = report.check(UNIQUENESS_CHECK).unwrap();

    assert_eq!(check.status, CheckStatus::Fail);
    let rows: Vec<_> = check
        .failing_rows
        .get("bank_account")
        .unwrap()
        .iter()
        .copied()
        .collect();
    assert_eq!(rows, vec![RowId(0), RowId(2)]);
    assert!(matches!(
        check.issues[0],
        Issue::Duplicates {
            duplicate_count: 2,
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn test_high_value_pin_only_transfer() -> Result<()> {
    let mut tables = banking_tables();
    let transactions = tables.get_mut("transaction").unwrap();
    transactions.push(transaction(4, 1, "Internal_Transfer", dec!(15000000), "PIN"));
    transactions.push(transaction(5, 1, "Internal_Transfer", dec!(15000000), "PIN_OTP"));
    let snapshot = snapshot_of(tables)?;

    let report = run_audit(&snapshot, &banking_rules()?).await;
    let check = report.check(HIGH_VALUE_AUTH_CHECK).unwrap();

    assert_eq!(check.status, CheckStatus::Fail);
    let rows = check.failing_rows.get("transaction").unwrap();
    assert!(rows.contains(&RowId(3)));
    assert!(!rows.contains(&RowId(4)));
    Ok(())
}

#[tokio::test]
async fn test_active_untrusted_device() -> Result<()> {
    let mut tables = banking_tables();
    tables
        .get_mut("customer_device")
        .unwrap()
        .push(device(4, 1, false, "Active"));
    let snapshot = snapshot_of(tables)?;

    let report = run_audit(&snapshot, &banking_rules()?).await;
    let check = report.check(DEVICE_TRUST_CHECK).unwrap();

    assert_eq!(check.status, CheckStatus::Fail);
    let rows: Vec<_> = check
        .failing_rows
        .get("customer_device")
        .unwrap()
        .iter()
        .copied()
        .collect();
    // the untrusted but blocked device (row 2) is not flagged
    assert_eq!(rows, vec![RowId(3)]);
    Ok(())
}

#[tokio::test]
async fn test_removed_customer_cascades_to_face_template() -> Result<()> {
    let mut tables = banking_tables();
    tables.get_mut("customer").unwrap()[1].insert("phone_number", Value::Null);
    let snapshot = snapshot_of(tables)?;

    let report = run_audit(&snapshot, &banking_rules()?).await;
    let failing = aggregate_report(&report);
    let (cleaned, summary) =
        clean_dataset(&snapshot, &failing, &RuleCatalog::banking().foreign_keys);

    let face = &summary.tables["face_template"];
    assert!(face.cascade_removed >= 1);
    assert_eq!(face.final_count, 1);
    assert_eq!(summary.tables["customer"].directly_removed, 1);
    // account A2 goes with its customer, then its transaction in the same pass
    assert_eq!(summary.tables["bank_account"].cascade_removed, 1);
    assert_eq!(summary.tables["transaction"].cascade_removed, 1);
    assert_fk_postcondition(&cleaned);
    let (again, _) = clean_dataset(&cleaned, &FailingRows::new(), &RuleCatalog::banking().foreign_keys);
    assert_eq!(again, cleaned);
    // the original stays available as evidence
    assert_eq!(snapshot.table("customer").unwrap().len(), 3);
    Ok(())
}

struct UnreachableOracle;

#[async_trait]
impl UniquenessOracle for UnreachableOracle {
    async fn existing_values(
        &self,
        _table: &str,
        _field: &str,
    ) -> Result<HashSet<String>, DomainError> {
        Err(DomainError::OracleUnavailable("database is locked".into()))
    }
}

#[tokio::test]
async fn test_unavailable_oracle_keeps_internal_duplicates() -> Result<()> {
    let mut tables = banking_tables();
    tables.get_mut("customer").unwrap()[2].insert("email", Value::from("user1@example.com"));
    let snapshot = snapshot_of(tables)?;
    let rules = RuleSet::compile(
        &RuleCatalog::banking(),
        Some(Arc::new(UnreachableOracle)),
        Duration::from_secs(1),
    )?;

    let report = run_audit(&snapshot, &rules).await;
    let check = report.check(UNIQUENESS_CHECK).unwrap();

    assert_eq!(check.status, CheckStatus::Fail);
    assert_eq!(check.failing_rows.count("customer"), 2);
    assert!(check.degraded.is_some());
    assert_eq!(check.summary["external_check_performed"], serde_json::json!(false));
    Ok(())
}

#[tokio::test]
async fn test_subtype_violations_do_not_remove_rows() -> Result<()> {
    let mut tables = banking_tables();
    tables.get_mut("transaction").unwrap()[2]
        .insert("recipient_bank_code", Value::from("VCB"));
    let snapshot = snapshot_of(tables)?;

    let report = run_audit(&snapshot, &banking_rules()?).await;
    assert_eq!(
        report.check(SUBTYPE_CONSTRAINT_CHECK).unwrap().status,
        CheckStatus::Fail
    );
    let failing = aggregate_report(&report);
    assert_eq!(failing.count("transaction"), 0);
    Ok(())
}

#[tokio::test]
async fn test_aggregate_is_union_of_checks() -> Result<()> {
    let mut tables = banking_tables();
    // customer 1: null phone and a malformed email; customer 3: orphaned account
    let customers = tables.get_mut("customer").unwrap();
    customers[0].insert("phone_number", Value::Null);
    customers[0].insert("email", Value::from("not-an-email"));
    tables.get_mut("bank_account").unwrap()[2].insert("customer_id", Value::from("C404"));
    let snapshot = snapshot_of(tables)?;

    let report = run_audit(&snapshot, &banking_rules()?).await;
    let failing = aggregate_report(&report);

    let sum: usize = report
        .checks
        .iter()
        .filter(|c| c.is_fail() && c.feeds_cleaning)
        .map(|c| c.failing_rows.count("customer"))
        .sum();
    assert_eq!(failing.count("customer"), 1);
    assert!(failing.count("customer") < sum);
    assert_eq!(
        report.check(FOREIGN_KEY_CHECK).unwrap().failing_rows.count("bank_account"),
        1
    );

    let (cleaned, _) = clean_dataset(&snapshot, &failing, &RuleCatalog::banking().foreign_keys);
    assert_fk_postcondition(&cleaned);
    Ok(())
}

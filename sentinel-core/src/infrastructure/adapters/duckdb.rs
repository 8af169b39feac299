// sentinel-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::types::Value as SqlValue;
use duckdb::{Config, Connection, params_from_iter};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

// Imports Hexagonaux
use crate::domain::dataset::{Table, Value};
use crate::domain::error::DomainError;
use crate::domain::ports::UniquenessOracle;
use crate::error::SentinelError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::DurableSink;

/// DuckDB-backed store: committed data for the uniqueness oracle, and the
/// destination of cleaned tables.
#[derive(Clone)]
pub struct DuckDbStore {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Schema and a sample of one persisted table.
#[derive(Debug, Clone, Serialize)]
pub struct TableInspection {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub row_count: u64,
    pub rows: Vec<Vec<Option<String>>>,
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Every value is bound as text (or blob) and cast by DuckDB to the column type.
fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::BigInt(*i),
        Value::Boolean(b) => SqlValue::Boolean(*b),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

impl DuckDbStore {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, InfrastructureError> {
        self.conn
            .lock()
            .map_err(|_| InfrastructureError::Database(DatabaseError::Poisoned))
    }

    fn column_type(conn: &Connection, table: &str, field: &str) -> Result<Option<String>, duckdb::Error> {
        let mut stmt = conn.prepare(
            "SELECT data_type FROM information_schema.columns WHERE table_name = ? AND column_name = ?",
        )?;
        let mut rows = stmt.query_map([table, field], |row| row.get::<_, String>(0))?;
        rows.next().transpose()
    }

    fn committed_values(&self, table: &str, field: &str) -> Result<HashSet<String>, InfrastructureError> {
        let conn = self.lock()?;
        // Nothing committed yet for this column.
        let Some(data_type) = Self::column_type(&conn, table, field)? else {
            debug!(table, field, "No committed column, oracle answers empty");
            return Ok(HashSet::new());
        };
        let decimal = data_type.starts_with("DECIMAL");

        let sql = format!(
            "SELECT DISTINCT CAST({f} AS VARCHAR) FROM {t} WHERE {f} IS NOT NULL",
            f = quote(field),
            t = quote(table)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut values = HashSet::new();
        for row in rows {
            let text = row?;
            // DECIMAL(38,10) renders with its full scale; keys carry none.
            let key = match Decimal::from_str(&text) {
                Ok(d) if decimal => Value::Decimal(d).key(),
                _ => text,
            };
            values.insert(key);
        }
        Ok(values)
    }

    fn append(&self, table: &Table) -> Result<(), InfrastructureError> {
        let kinds = table.column_kinds();
        if kinds.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let ddl = kinds
            .iter()
            .map(|(col, kind)| format!("{} {}", quote(col), kind.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote(table.name()),
            ddl
        ))?;

        let columns = kinds
            .iter()
            .map(|(col, _)| quote(col))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = kinds
            .iter()
            .map(|(_, kind)| format!("CAST(? AS {})", kind.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote(table.name()),
                columns,
                placeholders
            ))?;
            for (_, record) in table.rows() {
                let params = kinds.iter().map(|(col, _)| to_sql(record.get(col)));
                stmt.execute(params_from_iter(params))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Schema, row count and the first `limit` rows rendered as text.
    pub fn inspect(&self, table: &str, limit: usize) -> Result<TableInspection, InfrastructureError> {
        let conn = self.lock()?;

        let exists: i64 = conn.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
            [table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(InfrastructureError::InvalidData {
                table: table.to_string(),
                reason: "table does not exist in the database".into(),
            });
        }

        let mut stmt = conn.prepare(&format!(
            "PRAGMA table_info('{}')",
            table.replace('\'', "''")
        ))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get("name")?,
                    data_type: row.get("type")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let row_count: i64 = conn.query_row(
            &format!("SELECT count(*) FROM {}", quote(table)),
            [],
            |row| row.get(0),
        )?;

        let select = columns
            .iter()
            .map(|c| format!("CAST({} AS VARCHAR)", quote(&c.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} LIMIT {}",
            select,
            quote(table),
            limit
        ))?;
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TableInspection {
            table: table.to_string(),
            columns,
            row_count: u64::try_from(row_count).unwrap_or_default(),
            rows,
        })
    }
}

#[async_trait]
impl UniquenessOracle for DuckDbStore {
    /// The query runs on the blocking pool so a caller's timeout can still fire
    /// while the connection is busy.
    async fn existing_values(&self, table: &str, field: &str) -> Result<HashSet<String>, DomainError> {
        let store = self.clone();
        let (table, field) = (table.to_string(), field.to_string());
        tokio::task::spawn_blocking(move || store.committed_values(&table, &field))
            .await
            .map_err(|e| DomainError::OracleUnavailable(format!("oracle task failed: {}", e)))?
            .map_err(|e| DomainError::OracleUnavailable(e.to_string()))
    }
}

#[async_trait]
impl DurableSink for DuckDbStore {
    #[instrument(skip_all, fields(table = table.name(), rows = table.len()))]
    async fn persist(&self, table: &Table) -> Result<(), SentinelError> {
        self.append(table)?;
        info!("Table persisted");
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::dataset::Record;
    use anyhow::Result;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn accounts() -> Table {
        Table::new(
            "bank_account",
            vec![
                Record::new()
                    .with("account_id", "A1")
                    .with("account_number", "280000000000000001")
                    .with("current_balance", dec!(1500000.50))
                    .with("open_at", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
                Record::new()
                    .with("account_id", "A2")
                    .with("account_number", Value::Null)
                    .with("current_balance", dec!(0))
                    .with("open_at", NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()),
            ],
        )
    }

    #[tokio::test]
    async fn test_persist_then_oracle_sees_committed_values() -> Result<()> {
        let store = DuckDbStore::new(":memory:")?;
        store.persist(&accounts()).await?;

        let committed = store.existing_values("bank_account", "account_number").await?;
        assert_eq!(committed.len(), 1);
        assert!(committed.contains("280000000000000001"));
        Ok(())
    }

    #[tokio::test]
    async fn test_oracle_answers_decimal_keys_without_scale() -> Result<()> {
        let store = DuckDbStore::new(":memory:")?;
        store.persist(&accounts()).await?;

        let balances = store.existing_values("bank_account", "current_balance").await?;
        assert!(balances.contains("1500000.5"));
        assert!(balances.contains("0"));
        Ok(())
    }

    #[tokio::test]
    async fn test_oracle_on_empty_database_is_empty() -> Result<()> {
        let store = DuckDbStore::new(":memory:")?;
        assert!(store.existing_values("customer", "email").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    #[allow(clippy::await_holding_lock)]
    async fn test_busy_connection_lets_timeout_fire() -> Result<()> {
        let store = DuckDbStore::new(":memory:")?;
        store.persist(&accounts()).await?;

        let busy = store.lock()?;
        let answer = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.existing_values("bank_account", "account_number"),
        )
        .await;
        assert!(answer.is_err(), "oracle answered while the connection was held");
        drop(busy);

        // released: the next lookup goes through
        assert_eq!(store.existing_values("bank_account", "account_number").await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_persist_appends_with_typed_columns() -> Result<()> {
        let store = DuckDbStore::new(":memory:")?;
        store.persist(&accounts()).await?;
        store.persist(&accounts()).await?;

        let inspection = store.inspect("bank_account", 3)?;
        assert_eq!(inspection.row_count, 4);
        assert_eq!(inspection.rows.len(), 3);
        let balance = inspection
            .columns
            .iter()
            .find(|c| c.name == "current_balance")
            .unwrap();
        assert!(balance.data_type.starts_with("DECIMAL"));
        let opened = inspection.columns.iter().find(|c| c.name == "open_at").unwrap();
        assert_eq!(opened.data_type, "DATE");
        Ok(())
    }

    #[tokio::test]
    async fn test_inspect_unknown_table() -> Result<()> {
        let store = DuckDbStore::new(":memory:")?;
        assert!(matches!(
            store.inspect("nope", 5),
            Err(InfrastructureError::InvalidData { .. })
        ));
        Ok(())
    }
}

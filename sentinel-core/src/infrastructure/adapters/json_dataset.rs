// sentinel-core/src/infrastructure/adapters/json_dataset.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use crate::domain::dataset::value::parse_timestamp;
use crate::domain::dataset::{Record, Snapshot, Table, Value, ValueKind};
use crate::error::SentinelError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::DatasetProvider;

type ColumnTypes = BTreeMap<String, BTreeMap<String, ValueKind>>;

/// Reads one `<table>.json` file per table: a JSON array of flat objects.
pub struct JsonDirectoryProvider {
    data_dir: PathBuf,
    source: String,
    tables: Vec<String>,
    column_types: ColumnTypes,
}

impl JsonDirectoryProvider {
    /// `tables` empty means every `*.json` file found in `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, tables: Vec<String>, column_types: ColumnTypes) -> Self {
        let data_dir = data_dir.into();
        Self {
            source: data_dir.display().to_string(),
            data_dir,
            tables,
            column_types,
        }
    }

    fn table_files(&self) -> Result<Vec<(String, PathBuf)>, InfrastructureError> {
        if !self.tables.is_empty() {
            return Ok(self
                .tables
                .iter()
                .map(|t| (t.clone(), self.data_dir.join(format!("{}.json", t))))
                .collect());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                files.push((stem.to_string(), path.clone()));
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_table(&self, name: &str, path: &Path) -> Result<Table, InfrastructureError> {
        let content = fs::read_to_string(path)?;
        let invalid = |reason: String| InfrastructureError::InvalidData {
            table: name.to_string(),
            reason,
        };
        let raw: Vec<serde_json::Map<String, JsonValue>> =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        let empty = BTreeMap::new();
        let kinds = self.column_types.get(name).unwrap_or(&empty);
        let rows = raw
            .into_iter()
            .map(|object| {
                object
                    .into_iter()
                    .map(|(field, json)| {
                        let value = coerce(json, kinds.get(&field).copied());
                        (field, value)
                    })
                    .collect::<Record>()
            })
            .collect();
        Ok(Table::new(name, rows))
    }
}

/// Converts a JSON cell, honouring the declared column kind when there is one.
/// A cell that does not parse as its declared kind is kept as text so the
/// checks still see it.
fn coerce(json: JsonValue, kind: Option<ValueKind>) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(b),
        JsonValue::Number(n) => {
            // Raw literal text (arbitrary_precision), never an f64 rendering.
            let raw = n.to_string();
            match (kind, n.as_i64()) {
                (Some(ValueKind::Decimal), _) | (_, None) => parse_decimal(&raw)
                    .map(Value::Decimal)
                    .unwrap_or(Value::String(raw)),
                (_, Some(i)) => Value::Integer(i),
            }
        }
        JsonValue::String(s) => match kind.and_then(|k| parse_as(&s, k)) {
            Some(value) => value,
            None => Value::String(s),
        },
        other => Value::String(other.to_string()),
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_as(raw: &str, kind: ValueKind) -> Option<Value> {
    let parsed = match kind {
        ValueKind::Null | ValueKind::String => return None,
        ValueKind::Integer => raw.trim().parse().ok().map(Value::Integer),
        ValueKind::Decimal => parse_decimal(raw.trim()).map(Value::Decimal),
        ValueKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(Value::Boolean(true)),
            "false" | "0" => Some(Value::Boolean(false)),
            _ => None,
        },
        ValueKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| parse_timestamp(raw).map(|ts| ts.date()))
            .map(Value::Date),
        ValueKind::Timestamp => parse_timestamp(raw).map(Value::Timestamp),
        ValueKind::Bytes => Some(Value::Bytes(raw.as_bytes().to_vec())),
    };
    if parsed.is_none() {
        debug!(raw, ?kind, "Value kept as text");
    }
    parsed
}

#[async_trait]
impl DatasetProvider for JsonDirectoryProvider {
    #[instrument(skip_all, fields(dir = %self.source))]
    async fn load(&self) -> Result<Snapshot, SentinelError> {
        if !self.data_dir.is_dir() {
            return Err(InfrastructureError::ConfigNotFound(format!(
                "Data directory {:?} does not exist",
                self.data_dir
            ))
            .into());
        }

        let mut tables = Vec::new();
        for (name, path) in self.table_files()? {
            if !path.exists() {
                warn!(table = %name, "⚠️ No data file, table not loaded");
                continue;
            }
            let table = self.read_table(&name, &path)?;
            info!(table = %name, rows = table.len(), "Table loaded");
            tables.push(table);
        }

        Ok(Snapshot::from_tables(tables)?)
    }

    fn source_name(&self) -> &str {
        &self.source
    }
}

// sentinel-core/src/domain/dataset/snapshot.rs

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::table::Table;
use crate::domain::error::DomainError;

/// Immutable multi-table view of a dataset.
/// Tables are shared behind `Arc`, so deriving a cleaned snapshot only copies
/// the tables that actually changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    tables: BTreeMap<String, Arc<Table>>,
}

impl Snapshot {
    /// Builds a snapshot. Duplicate table names are rejected.
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Result<Self, DomainError> {
        let mut map = BTreeMap::new();
        for table in tables {
            let name = table.name().to_string();
            if map.insert(name.clone(), Arc::new(table)).is_some() {
                return Err(DomainError::InvalidSnapshot(format!(
                    "table '{}' provided twice",
                    name
                )));
            }
        }
        Ok(Self { tables: map })
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name).map(|t| t.as_ref())
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values().map(|t| t.as_ref())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn total_records(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// True when the table exists and declares the field.
    pub fn has_field(&self, table: &str, field: &str) -> bool {
        self.table(table).is_some_and(|t| t.has_column(field))
    }

    /// New snapshot where `table` replaces the table of the same name.
    pub fn with_table(&self, table: Table) -> Snapshot {
        let mut tables = self.tables.clone();
        tables.insert(table.name().to_string(), Arc::new(table));
        Snapshot { tables }
    }

    /// New snapshot restricted to the given table names.
    pub fn retain(&self, keep: impl Fn(&str) -> bool) -> Snapshot {
        Snapshot {
            tables: self
                .tables
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, t)| (name.clone(), Arc::clone(t)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Record;

    #[test]
    fn test_duplicate_table_rejected() {
        let res = Snapshot::from_tables(vec![
            Table::new("a", vec![]),
            Table::new("a", vec![Record::new().with("x", 1)]),
        ]);
        assert!(matches!(res, Err(DomainError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_with_table_leaves_original() -> Result<(), DomainError> {
        let original = Snapshot::from_tables(vec![Table::new(
            "a",
            vec![Record::new().with("x", 1)],
        )])?;
        let derived = original.with_table(Table::new("a", vec![]));
        assert_eq!(original.total_records(), 1);
        assert_eq!(derived.total_records(), 0);
        Ok(())
    }

    #[test]
    fn test_serializes_shared_tables() -> anyhow::Result<()> {
        let snapshot = Snapshot::from_tables(vec![Table::new(
            "customer",
            vec![Record::new().with("customer_id", "C1").with("age", 41)],
        )])?;
        let json = serde_json::to_value(&snapshot)?;
        let row = &json["tables"]["customer"]["rows"][0];
        assert_eq!(row["customer_id"], "C1");
        assert_eq!(row["age"], 41);
        Ok(())
    }
}

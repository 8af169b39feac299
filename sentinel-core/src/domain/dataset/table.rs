// sentinel-core/src/domain/dataset/table.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::value::{Value, ValueKind};

/// Positional handle of a row inside one snapshot generation.
/// Not a durable key: cleaning re-sequences survivors densely from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Field name -> value. A field missing from the map reads as NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

static NULL: Value = Value::Null;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn is_null(&self, field: &str) -> bool {
        self.get(field).is_null()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A named, ordered collection of records. Row ids are the record positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Builds a table whose columns are the union of all record fields (sorted).
    pub fn new(name: impl Into<String>, rows: Vec<Record>) -> Self {
        let columns: BTreeSet<String> = rows
            .iter()
            .flat_map(|r| r.fields().map(|(k, _)| k.clone()))
            .collect();
        Self {
            name: name.into(),
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    /// Builds a table with an explicit column list (kept even when there are no rows).
    pub fn with_columns(name: impl Into<String>, columns: Vec<String>, rows: Vec<Record>) -> Self {
        let mut columns = columns;
        for row in &rows {
            for (field, _) in row.fields() {
                if !columns.contains(field) {
                    columns.push(field.clone());
                }
            }
        }
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c == field)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: RowId) -> Option<&Record> {
        self.rows.get(id.0)
    }

    pub fn contains(&self, id: RowId) -> bool {
        id.0 < self.rows.len()
    }

    /// Iterates `(RowId, &Record)` in storage order.
    pub fn rows(&self) -> impl Iterator<Item = (RowId, &Record)> {
        self.rows.iter().enumerate().map(|(i, r)| (RowId(i), r))
    }

    /// Non-null values of a field, with their row ids.
    pub fn non_null(&self, field: &str) -> impl Iterator<Item = (RowId, &Value)> {
        self.rows()
            .map(move |(id, r)| (id, r.get(field)))
            .filter(|(_, v)| !v.is_null())
    }

    /// Returns a new table without the given rows. Survivors keep their relative
    /// order and are re-sequenced from zero; ids absent from the table are ignored.
    pub fn without(&self, removed: &BTreeSet<RowId>) -> Table {
        let rows = self
            .rows()
            .filter(|(id, _)| !removed.contains(id))
            .map(|(_, r)| r.clone())
            .collect();
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    /// First non-null kind per column, used to derive a storage schema.
    pub fn column_kinds(&self) -> Vec<(String, ValueKind)> {
        self.columns
            .iter()
            .map(|col| {
                let kind = self
                    .non_null(col)
                    .map(|(_, v)| v.kind())
                    .next()
                    .unwrap_or(ValueKind::String);
                (col.clone(), kind)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn people() -> Table {
        Table::new(
            "people",
            vec![
                Record::new().with("id", 1).with("name", "a"),
                Record::new().with("id", 2),
                Record::new().with("id", 3).with("name", "c"),
            ],
        )
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let table = people();
        assert!(table.has_column("name"));
        assert!(table.row(RowId(1)).unwrap().is_null("name"));
        assert_eq!(table.non_null("name").count(), 2);
    }

    #[test]
    fn test_without_resequences_densely() {
        let table = people();
        let removed: BTreeSet<RowId> = [RowId(0), RowId(42)].into_iter().collect();
        let cleaned = table.without(&removed);

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.row(RowId(0)).unwrap().get("id"), &Value::Integer(2));
        assert_eq!(cleaned.row(RowId(1)).unwrap().get("id"), &Value::Integer(3));
        // Original untouched
        assert_eq!(table.len(), 3);
    }
}

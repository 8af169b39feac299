// sentinel-core/src/domain/catalog/relationship.rs

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use validator::Validate;

/// Directed edge (child table, child field) -> (parent table, parent field).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct ForeignKey {
    #[validate(length(min = 1))]
    pub child_table: String,
    #[validate(length(min = 1))]
    pub child_field: String,
    #[validate(length(min = 1))]
    pub parent_table: String,
    #[validate(length(min = 1))]
    pub parent_field: String,
}

impl ForeignKey {
    pub fn new(child_table: &str, child_field: &str, parent_table: &str, parent_field: &str) -> Self {
        Self {
            child_table: child_table.to_string(),
            child_field: child_field.to_string(),
            parent_table: parent_table.to_string(),
            parent_field: parent_field.to_string(),
        }
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.child_table, self.child_field, self.parent_table, self.parent_field
        )
    }
}

/// Table-level dependency graph induced by the foreign keys.
pub struct DependencyGraph;

impl DependencyGraph {
    /// Parent-first layering of tables (Kahn's algorithm).
    /// Layer N only references tables of layers 0..N-1. Self references are
    /// ignored for ordering; any other cycle is an error.
    pub fn load_order(
        tables: &[String],
        relationships: &[ForeignKey],
    ) -> Result<Vec<Vec<String>>, DomainError> {
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut children: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for name in tables {
            in_degree.insert(name.as_str(), 0);
            children.insert(name.as_str(), BTreeSet::new());
        }
        for fk in relationships {
            in_degree.entry(fk.child_table.as_str()).or_insert(0);
            in_degree.entry(fk.parent_table.as_str()).or_insert(0);
        }

        // Several FKs between the same pair of tables count as one edge.
        for fk in relationships {
            if fk.child_table == fk.parent_table {
                continue;
            }
            let inserted = children
                .entry(fk.parent_table.as_str())
                .or_default()
                .insert(fk.child_table.as_str());
            if inserted {
                *in_degree.entry(fk.child_table.as_str()).or_insert(0) += 1;
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(name, _)| *name)
            .collect();

        let total = in_degree.len();
        let mut resolved = 0;
        let mut layers = Vec::new();

        while !queue.is_empty() {
            let layer_size = queue.len();
            let mut layer = Vec::with_capacity(layer_size);
            for _ in 0..layer_size {
                if let Some(current) = queue.pop_front() {
                    layer.push(current.to_string());
                    resolved += 1;
                    if let Some(next) = children.get(current) {
                        for child in next {
                            if let Some(degree) = in_degree.get_mut(child) {
                                *degree -= 1;
                                if *degree == 0 {
                                    queue.push_back(*child);
                                }
                            }
                        }
                    }
                }
            }
            layers.push(layer);
        }

        if resolved != total {
            let stuck: Vec<&str> = in_degree
                .iter()
                .filter(|(_, d)| **d > 0)
                .map(|(name, _)| *name)
                .collect();
            return Err(DomainError::CircularDependency(format!(
                "Resolved {}/{} tables; cycle among [{}]",
                resolved,
                total,
                stuck.join(", ")
            )));
        }

        Ok(layers)
    }

    /// Flattened parent-first order.
    pub fn flat_order(
        tables: &[String],
        relationships: &[ForeignKey],
    ) -> Result<Vec<String>, DomainError> {
        Ok(Self::load_order(tables, relationships)?
            .into_iter()
            .flatten()
            .collect())
    }
}

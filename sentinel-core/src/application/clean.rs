// sentinel-core/src/application/clean.rs

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

use crate::domain::catalog::ForeignKey;
use crate::domain::checks::FailingRows;
use crate::domain::checks::percentage;
use crate::domain::checks::rules::foreign_key::key_set;
use crate::domain::dataset::{RowId, Snapshot};
use crate::domain::project::CascadeMode;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCleaning {
    pub original_count: usize,
    pub directly_removed: usize,
    pub cascade_removed: usize,
    pub final_count: usize,
    pub retained_percentage: f64,
}

/// One application of one relationship during the cascade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeStat {
    pub relationship: String,
    pub pass: usize,
    pub original_count: usize,
    pub removed: usize,
    pub final_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningSummary {
    pub tables: BTreeMap<String, TableCleaning>,
    pub cascades: Vec<CascadeStat>,
    pub cascade_mode: CascadeMode,
    pub cascade_passes: usize,
    pub total_original: usize,
    pub total_retained: usize,
    pub records_removed: usize,
    pub retained_percentage: f64,
}

fn retained(final_count: usize, original: usize) -> f64 {
    if original == 0 {
        100.0
    } else {
        percentage(final_count, original)
    }
}

/// Removes failing rows, then cascades removals along the foreign keys.
pub struct Cleaner {
    relationships: Vec<ForeignKey>,
    mode: CascadeMode,
}

impl Cleaner {
    pub fn new(relationships: Vec<ForeignKey>, mode: CascadeMode) -> Self {
        Self {
            relationships,
            mode,
        }
    }

    /// Produces a new snapshot; `snapshot` itself is left untouched.
    #[instrument(skip_all, fields(mode = ?self.mode))]
    pub fn clean(&self, snapshot: &Snapshot, failing: &FailingRows) -> (Snapshot, CleaningSummary) {
        let mut current = snapshot.clone();
        let mut direct: BTreeMap<String, usize> = BTreeMap::new();
        let mut cascaded: BTreeMap<String, usize> = BTreeMap::new();

        // 1. Direct removal
        for table in snapshot.tables() {
            let Some(flagged) = failing.get(table.name()) else {
                continue;
            };
            let present: BTreeSet<RowId> = flagged
                .iter()
                .copied()
                .filter(|id| table.contains(*id))
                .collect();
            let stale = flagged.len() - present.len();
            if stale > 0 {
                debug!(table = %table.name(), stale, "Ignoring row ids absent from the table");
            }
            if present.is_empty() {
                continue;
            }
            info!(
                table = %table.name(),
                removed = present.len(),
                remaining = table.len() - present.len(),
                "Removed failing rows"
            );
            direct.insert(table.name().to_string(), present.len());
            current = current.with_table(table.without(&present));
        }
        for table in failing.tables() {
            if snapshot.table(table).is_none() {
                debug!(table = %table, "Failing rows reference a table absent from the snapshot");
            }
        }

        // 2. Foreign key cascade
        let mut cascades = Vec::new();
        let mut passes = 0;
        loop {
            passes += 1;
            let removed = self.cascade_pass(&mut current, passes, &mut cascades, &mut cascaded);
            if self.mode == CascadeMode::SinglePass || removed == 0 {
                break;
            }
        }

        // 3. Summary
        let mut tables = BTreeMap::new();
        for original in snapshot.tables() {
            let name = original.name();
            let final_count = current.table(name).map_or(0, |t| t.len());
            tables.insert(
                name.to_string(),
                TableCleaning {
                    original_count: original.len(),
                    directly_removed: direct.get(name).copied().unwrap_or(0),
                    cascade_removed: cascaded.get(name).copied().unwrap_or(0),
                    final_count,
                    retained_percentage: retained(final_count, original.len()),
                },
            );
        }
        let total_original = snapshot.total_records();
        let total_retained = current.total_records();
        let summary = CleaningSummary {
            tables,
            cascades,
            cascade_mode: self.mode,
            cascade_passes: passes,
            total_original,
            total_retained,
            records_removed: total_original - total_retained,
            retained_percentage: retained(total_retained, total_original),
        };
        info!(
            original = summary.total_original,
            retained = summary.total_retained,
            removed = summary.records_removed,
            "Cleaning finished"
        );

        (current, summary)
    }

    /// Applies every relationship once, in declared order. Returns the number of rows removed.
    fn cascade_pass(
        &self,
        current: &mut Snapshot,
        pass: usize,
        stats: &mut Vec<CascadeStat>,
        cascaded: &mut BTreeMap<String, usize>,
    ) -> usize {
        let mut removed_total = 0;
        for fk in &self.relationships {
            if !current.has_field(&fk.child_table, &fk.child_field)
                || !current.has_field(&fk.parent_table, &fk.parent_field)
            {
                continue;
            }
            let (Some(child), Some(parent)) =
                (current.table(&fk.child_table), current.table(&fk.parent_table))
            else {
                continue;
            };

            let parent_keys = key_set(parent, &fk.parent_field);
            let orphans: BTreeSet<RowId> = child
                .non_null(&fk.child_field)
                .filter(|(_, v)| !parent_keys.contains(&v.key()))
                .map(|(id, _)| id)
                .collect();

            let original_count = child.len();
            stats.push(CascadeStat {
                relationship: fk.to_string(),
                pass,
                original_count,
                removed: orphans.len(),
                final_count: original_count - orphans.len(),
            });
            if orphans.is_empty() {
                continue;
            }

            info!(relationship = %fk, removed = orphans.len(), "Cascade removal");
            let cleaned = child.without(&orphans);
            *cascaded.entry(fk.child_table.clone()).or_default() += orphans.len();
            removed_total += orphans.len();
            *current = current.with_table(cleaned);
        }
        removed_total
    }
}

/// Single-pass cleaning, the default behaviour.
pub fn clean_dataset(
    snapshot: &Snapshot,
    failing: &FailingRows,
    relationships: &[ForeignKey],
) -> (Snapshot, CleaningSummary) {
    Cleaner::new(relationships.to_vec(), CascadeMode::SinglePass).clean(snapshot, failing)
}

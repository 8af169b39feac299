// sentinel-core/src/application/mod.rs

pub mod aggregate;
pub mod audit;
pub mod clean;
pub mod report;

pub mod pipeline;

#[cfg(test)]
mod scenarios;

// --- RE-EXPORTS (FACADE PATTERN) ---
pub use aggregate::{aggregate_failures, aggregate_report};
pub use audit::{AuditReport, run_audit};
pub use clean::{CascadeStat, Cleaner, CleaningSummary, TableCleaning, clean_dataset};
pub use pipeline::{RunResult, TableLoad, audit_dataset, run_pipeline};

// sentinel-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (outward collaborators: dataset provider, durable sink)
pub mod ports;

// 2. Domain (dataset model, rule catalog, checks)
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure (DuckDB, JSON files, YAML config)
pub mod infrastructure;

// 4. Application (audit runner, aggregation, cleaning, reports)
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

#[cfg(test)]
pub(crate) mod test_support;

// --- RE-EXPORTS (FACADE) ---
pub use error::SentinelError;

// sentinel-core/src/infrastructure/adapters/mod.rs

pub mod duckdb;
pub mod json_dataset;

pub use self::duckdb::{ColumnInfo, DuckDbStore, TableInspection};
pub use json_dataset::JsonDirectoryProvider;

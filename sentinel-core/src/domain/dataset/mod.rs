// sentinel-core/src/domain/dataset/mod.rs

pub mod snapshot;
pub mod table;
pub mod value;

pub use snapshot::Snapshot;
pub use table::{Record, RowId, Table};
pub use value::{Value, ValueKind};

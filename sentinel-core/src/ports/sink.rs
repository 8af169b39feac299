// sentinel-core/src/ports/sink.rs

use crate::domain::dataset::Table;
use crate::error::SentinelError;
use async_trait::async_trait;

/// Durable storage for cleaned tables. Reports success or failure per table,
/// no per-row detail, and no atomicity across tables.
#[async_trait]
pub trait DurableSink: Send + Sync {
    async fn persist(&self, table: &Table) -> Result<(), SentinelError>;

    fn engine_name(&self) -> &str;
}

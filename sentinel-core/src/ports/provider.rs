// sentinel-core/src/ports/provider.rs

use crate::domain::dataset::Snapshot;
use crate::error::SentinelError;
use async_trait::async_trait;

/// Supplies the snapshot to audit. Where the data comes from (generated,
/// ingested, exported) is the adapter's business.
#[async_trait]
pub trait DatasetProvider: Send + Sync {
    /// Failing here is the only error that aborts a whole run.
    async fn load(&self) -> Result<Snapshot, SentinelError>;

    fn source_name(&self) -> &str;
}

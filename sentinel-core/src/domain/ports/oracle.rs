// sentinel-core/src/domain/ports/oracle.rs

use crate::domain::error::DomainError;
use async_trait::async_trait;
use std::collections::HashSet;

/// Answers "which values of `table.field` are already committed?".
/// Values are compared as `Value::key` text, so implementations must answer in
/// that form (decimals without trailing zeros).
/// Implementations may be slow or unavailable; callers bound and tolerate both.
#[async_trait]
pub trait UniquenessOracle: Send + Sync {
    async fn existing_values(&self, table: &str, field: &str)
    -> Result<HashSet<String>, DomainError>;
}

//! Cache executor trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::domain::DomainError;

/// Key to opaque blob cache with swappable backends
///
/// Entries never expire on their own. A present entry stays authoritative
/// until it is overwritten or deleted.
#[async_trait]
pub trait CacheExecutor: Send + Sync + Debug {
    /// Gets a blob. A miss is `Ok(None)`; `Err` means the backend failed.
    async fn get(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<Option<Bytes>, DomainError>;

    /// Stores a blob, overwriting any previous value
    async fn set(
        &self,
        cancel: &CancellationToken,
        key: &str,
        value: Bytes,
    ) -> Result<(), DomainError>;

    /// Removes a key. Removing an absent key succeeds.
    async fn delete(&self, cancel: &CancellationToken, key: &str) -> Result<(), DomainError>;

    /// Checks that the backend is reachable
    async fn ping(&self, _cancel: &CancellationToken) -> Result<(), DomainError> {
        Ok(())
    }
}

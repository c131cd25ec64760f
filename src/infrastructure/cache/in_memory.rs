//! In-memory cache implementation using moka

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache as MokaCache;
use tokio_util::sync::CancellationToken;

use crate::domain::cache::CacheExecutor;
use crate::domain::{ensure_active, DomainError};

/// Thread-safe in-memory cache implementation using moka
///
/// Built without capacity, TTL or idle bounds: entries live until they are
/// overwritten or deleted.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, Bytes>,
}

impl InMemoryCache {
    /// Creates a new empty in-memory cache
    pub fn new() -> Self {
        Self {
            cache: MokaCache::builder().build(),
        }
    }

    /// Approximate number of live entries
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheExecutor for InMemoryCache {
    async fn get(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<Option<Bytes>, DomainError> {
        ensure_active(cancel, "cache get")?;
        Ok(self.cache.get(key).await)
    }

    async fn set(
        &self,
        cancel: &CancellationToken,
        key: &str,
        value: Bytes,
    ) -> Result<(), DomainError> {
        ensure_active(cancel, "cache set")?;
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn delete(&self, cancel: &CancellationToken, key: &str) -> Result<(), DomainError> {
        ensure_active(cancel, "cache delete")?;
        self.cache.invalidate(key).await;
        Ok(())
    }
}

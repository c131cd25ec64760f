//! Repository provider - one storage and one cache behind a single handle

use std::fmt;
use std::sync::Arc;

use super::cache::CacheExecutor;
use super::storage::StorageExecutor;

/// Bundles exactly one storage executor and one cache executor
///
/// Built once per process and shared read-only by every request. Cloning
/// copies two `Arc`s; nothing on the provider itself is mutable, all state
/// lives inside the executors.
#[derive(Clone)]
pub struct RepositoryProvider {
    storage: Arc<dyn StorageExecutor>,
    cache: Arc<dyn CacheExecutor>,
}

impl RepositoryProvider {
    pub fn new(storage: Arc<dyn StorageExecutor>, cache: Arc<dyn CacheExecutor>) -> Self {
        Self { storage, cache }
    }

    pub fn storage(&self) -> &Arc<dyn StorageExecutor> {
        &self.storage
    }

    pub fn cache(&self) -> &Arc<dyn CacheExecutor> {
        &self.cache
    }

    /// Storage handle for request-scoped attachment
    pub fn storage_handle(&self) -> StorageHandle {
        StorageHandle(Arc::clone(&self.storage))
    }

    /// Cache handle for request-scoped attachment
    pub fn cache_handle(&self) -> CacheHandle {
        CacheHandle(Arc::clone(&self.cache))
    }
}

impl fmt::Debug for RepositoryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryProvider")
            .field("storage", &self.storage)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Storage executor attached to a request on its own, distinct from the provider
#[derive(Clone, Debug)]
pub struct StorageHandle(pub Arc<dyn StorageExecutor>);

/// Cache executor attached to a request on its own, distinct from the provider
#[derive(Clone, Debug)]
pub struct CacheHandle(pub Arc<dyn CacheExecutor>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::domain::storage::MockStorage;

    #[test]
    fn test_handles_share_executors() {
        let provider =
            RepositoryProvider::new(Arc::new(MockStorage::new()), Arc::new(MockCache::new()));

        let storage = provider.storage_handle();
        let cache = provider.cache_handle();

        assert!(Arc::ptr_eq(&storage.0, provider.storage()));
        assert!(Arc::ptr_eq(&cache.0, provider.cache()));
    }

    #[test]
    fn test_clone_shares_executors() {
        let provider =
            RepositoryProvider::new(Arc::new(MockStorage::new()), Arc::new(MockCache::new()));
        let cloned = provider.clone();

        assert!(Arc::ptr_eq(provider.storage(), cloned.storage()));
        assert!(Arc::ptr_eq(provider.cache(), cloned.cache()));
    }
}

//! Builds the process-wide repository provider from configuration

use tracing::info;

use crate::config::AppConfig;
use crate::domain::{DomainError, RepositoryProvider};

use super::cache::{CacheConfig, CacheFactory};
use super::storage::{StorageConfig, StorageFactory};

/// Connects the configured storage and cache backends and bundles them
///
/// Called once at startup; the result is shared by every request.
pub async fn build_provider(config: &AppConfig) -> Result<RepositoryProvider, DomainError> {
    let storage_config = StorageConfig::from_settings(&config.storage)?;
    let cache_config = CacheConfig::from_settings(&config.cache)?;

    let storage = StorageFactory::create(&storage_config).await?;
    let cache = CacheFactory::new().create(&cache_config).await?;

    info!(
        storage = %storage_config.storage_type(),
        cache = %cache_config.cache_type,
        "Repository provider ready"
    );

    Ok(RepositoryProvider::new(storage, cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_build_default_provider() {
        let provider = build_provider(&AppConfig::default()).await.unwrap();
        let token = CancellationToken::new();

        assert!(provider.storage().ping(&token).await.is_ok());
        assert!(provider.cache().ping(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_build_provider_rejects_unknown_backend() {
        let mut config = AppConfig::default();
        config.cache.backend = "memcached".to_string();

        let result = build_provider(&config).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}

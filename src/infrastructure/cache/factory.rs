//! Cache factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheSettings;
use crate::domain::cache::CacheExecutor;
use crate::domain::DomainError;

use super::in_memory::InMemoryCache;
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache types
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CacheType {
    /// In-memory cache using moka
    #[default]
    InMemory,
    /// Redis cache
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for cache factory
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Type of cache to create
    pub cache_type: CacheType,
    /// Redis URL (required for Redis type)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Redis connection timeout
    pub connection_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::default(),
            redis_url: None,
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl CacheConfig {
    /// Builds the configuration from the application settings
    pub fn from_settings(settings: &CacheSettings) -> Result<Self, DomainError> {
        Ok(Self {
            cache_type: settings.backend.parse()?,
            redis_url: settings.redis_url.clone(),
            key_prefix: settings.key_prefix.clone(),
            connection_timeout: Duration::from_secs(settings.connect_timeout_secs),
        })
    }
}

/// Factory for creating cache instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    /// Creates a new cache factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache instance based on configuration
    pub async fn create(&self, config: &CacheConfig) -> Result<Arc<dyn CacheExecutor>, DomainError> {
        match config.cache_type {
            CacheType::InMemory => Ok(Arc::new(InMemoryCache::new())),
            CacheType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for Redis cache type")
                })?;

                let mut redis_config =
                    RedisCacheConfig::new(url).with_connection_timeout(config.connection_timeout);

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                let cache = RedisCache::new(redis_config).await?;
                Ok(Arc::new(cache))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_cache_type_from_str() {
        assert_eq!("in_memory".parse::<CacheType>().unwrap(), CacheType::InMemory);
        assert_eq!("inmemory".parse::<CacheType>().unwrap(), CacheType::InMemory);
        assert_eq!("memory".parse::<CacheType>().unwrap(), CacheType::InMemory);
        assert_eq!("redis".parse::<CacheType>().unwrap(), CacheType::Redis);
        assert_eq!("REDIS".parse::<CacheType>().unwrap(), CacheType::Redis);
    }

    #[test]
    fn test_cache_type_from_str_invalid() {
        let result = "memcached".parse::<CacheType>();
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_config_from_settings() {
        let settings = CacheSettings {
            backend: "redis".to_string(),
            redis_url: Some("redis://localhost:6379".to_string()),
            key_prefix: Some("records".to_string()),
            connect_timeout_secs: 2,
        };

        let config = CacheConfig::from_settings(&settings).unwrap();
        assert_eq!(config.connection_timeout, Duration::from_secs(2));
        assert_eq!(config.cache_type, CacheType::Redis);
        assert_eq!(config.redis_url, Some("redis://localhost:6379".to_string()));
        assert_eq!(config.key_prefix, Some("records".to_string()));
    }

    #[tokio::test]
    async fn test_factory_create_in_memory() {
        let factory = CacheFactory::new();
        let cache = factory.create(&CacheConfig::default()).await.unwrap();
        let token = CancellationToken::new();

        cache
            .set(&token, "test", Bytes::from_static(b"value"))
            .await
            .unwrap();

        let result = cache.get(&token, "test").await.unwrap();
        assert_eq!(result, Some(Bytes::from_static(b"value")));
    }

    #[tokio::test]
    async fn test_factory_create_redis_missing_url() {
        let factory = CacheFactory::new();
        let config = CacheConfig {
            cache_type: CacheType::Redis,
            redis_url: None,
            ..Default::default()
        };

        let result = factory.create(&config).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_type_display() {
        assert_eq!(CacheType::InMemory.to_string(), "in_memory");
        assert_eq!(CacheType::Redis.to_string(), "redis");
    }
}

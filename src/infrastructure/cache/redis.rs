//! Redis cache implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio_util::sync::CancellationToken;

use crate::domain::cache::CacheExecutor;
use crate::domain::{cancellable, DomainError};

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// Values are stored as raw bytes without expiry. The `ConnectionManager`
/// reconnects transparently; failed commands surface as cache errors.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| {
            DomainError::cache(format!(
                "Timed out connecting to Redis after {:?}",
                config.connection_timeout
            ))
        })?
        .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        prefixed(self.config.key_prefix.as_deref(), key)
    }
}

fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, key),
        None => key.to_string(),
    }
}

#[async_trait]
impl CacheExecutor for RedisCache {
    async fn get(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<Option<Bytes>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let result: Option<Vec<u8>> = cancellable(cancel, "cache get", async {
            conn.get(&prefixed_key).await.map_err(|e| {
                DomainError::cache(format!("Failed to get key '{}': {}", key, e))
            })
        })
        .await?;

        Ok(result.map(Bytes::from))
    }

    async fn set(
        &self,
        cancel: &CancellationToken,
        key: &str,
        value: Bytes,
    ) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        cancellable(cancel, "cache set", async {
            conn.set::<_, _, ()>(&prefixed_key, value.as_ref())
                .await
                .map_err(|e| DomainError::cache(format!("Failed to set key '{}': {}", key, e)))
        })
        .await
    }

    async fn delete(&self, cancel: &CancellationToken, key: &str) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        // DEL reports 0 for absent keys, which is still a success
        cancellable(cancel, "cache delete", async {
            conn.del::<_, i64>(&prefixed_key)
                .await
                .map(|_| ())
                .map_err(|e| {
                    DomainError::cache(format!("Failed to delete key '{}': {}", key, e))
                })
        })
        .await
    }

    async fn ping(&self, cancel: &CancellationToken) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        cancellable(cancel, "cache ping", async {
            redis::cmd("PING")
                .query_async::<String>(&mut conn)
                .await
                .map(|_| ())
                .map_err(|e| DomainError::cache(format!("Redis ping failed: {}", e)))
        })
        .await
    }
}

//! Storage factory for runtime storage selection

use std::sync::Arc;

use crate::config::StorageSettings;
use crate::domain::storage::StorageExecutor;
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::postgres::{PostgresConfig, PostgresStorage};

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::InMemory => write!(f, "in_memory"),
            StorageType::Postgres => write!(f, "postgres"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// Builds the configuration from the application settings
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, DomainError> {
        let storage_type = StorageType::from_str(&settings.backend).ok_or_else(|| {
            DomainError::configuration(format!(
                "Unknown storage type: {}. Valid types: in_memory, postgres",
                settings.backend
            ))
        })?;

        match storage_type {
            StorageType::InMemory => Ok(Self::InMemory),
            StorageType::Postgres => {
                let url = settings.postgres_url.clone().ok_or_else(|| {
                    DomainError::configuration("PostgreSQL URL is required for postgres storage")
                })?;

                validate_relation(&settings.relation)?;

                Ok(Self::Postgres(
                    PostgresConfig::new(url)
                        .with_relation(settings.relation.clone())
                        .with_max_connections(settings.max_connections)
                        .with_min_connections(settings.min_connections)
                        .with_connect_timeout(settings.connect_timeout_secs)
                        .with_idle_timeout(settings.idle_timeout_secs),
                ))
            }
        }
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// The relation name is interpolated into SQL, so only plain identifiers
/// within PostgreSQL's 63-byte limit are accepted.
fn validate_relation(relation: &str) -> Result<(), DomainError> {
    let mut chars = relation.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && relation.len() <= 63 {
        Ok(())
    } else {
        Err(DomainError::configuration(format!(
            "Invalid PostgreSQL relation name '{}': expected letters, digits and underscores",
            relation
        )))
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a storage instance based on the configuration
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn StorageExecutor>, DomainError> {
        match config {
            StorageConfig::InMemory => Ok(Arc::new(InMemoryStorage::new())),
            StorageConfig::Postgres(pg_config) => {
                let storage = PostgresStorage::connect(pg_config).await?;
                storage.ensure_table().await?;
                Ok(Arc::new(storage))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_from_str() {
        assert_eq!(StorageType::from_str("memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::from_str("in-memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::from_str("IN_MEMORY"), Some(StorageType::InMemory));
        assert_eq!(StorageType::from_str("postgresql"), Some(StorageType::Postgres));
        assert_eq!(StorageType::from_str("pg"), Some(StorageType::Postgres));
        assert_eq!(StorageType::from_str("unknown"), None);
    }

    #[test]
    fn test_storage_config_from_settings() {
        let settings = StorageSettings::default();
        let config = StorageConfig::from_settings(&settings).unwrap();
        assert_eq!(config.storage_type(), StorageType::InMemory);

        let settings = StorageSettings {
            backend: "postgres".to_string(),
            postgres_url: Some("postgres://localhost/test".to_string()),
            max_connections: 4,
            min_connections: 2,
            connect_timeout_secs: 3,
            idle_timeout_secs: 60,
            ..Default::default()
        };

        match StorageConfig::from_settings(&settings).unwrap() {
            StorageConfig::Postgres(pg) => {
                assert_eq!(pg.url, "postgres://localhost/test");
                assert_eq!(pg.max_connections, 4);
                assert_eq!(pg.min_connections, 2);
                assert_eq!(pg.connect_timeout_secs, 3);
                assert_eq!(pg.idle_timeout_secs, 60);
                assert_eq!(pg.relation, settings.relation);
            }
            other => panic!("Expected Postgres config, got {:?}", other),
        }
    }

    #[test]
    fn test_postgres_settings_without_url() {
        let settings = StorageSettings {
            backend: "postgres".to_string(),
            postgres_url: None,
            ..Default::default()
        };

        let result = StorageConfig::from_settings(&settings);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_unknown_backend() {
        let settings = StorageSettings {
            backend: "sqlite".to_string(),
            ..Default::default()
        };

        assert!(StorageConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_relation_must_be_identifier() {
        let with_relation = |relation: &str| StorageSettings {
            backend: "postgres".to_string(),
            postgres_url: Some("postgres://localhost/test".to_string()),
            relation: relation.to_string(),
            ..Default::default()
        };

        let too_long = "r".repeat(64);
        for bad in [
            "",
            "1records",
            "records; DROP TABLE users",
            "public.records",
            "rec\"ords",
            too_long.as_str(),
        ] {
            let result = StorageConfig::from_settings(&with_relation(bad));
            assert!(
                matches!(result, Err(DomainError::Configuration { .. })),
                "relation {:?} should be rejected",
                bad
            );
        }

        for good in ["stored_records", "_records", "Records2"] {
            assert!(StorageConfig::from_settings(&with_relation(good)).is_ok());
        }
    }

    #[tokio::test]
    async fn test_factory_create_in_memory() {
        let storage = StorageFactory::create(&StorageConfig::InMemory).await.unwrap();
        let token = tokio_util::sync::CancellationToken::new();

        let id = storage
            .insert(&token, "records", serde_json::json!("A"))
            .await
            .unwrap();
        assert_eq!(id, 1);
    }
}

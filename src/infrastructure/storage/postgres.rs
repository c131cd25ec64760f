//! PostgreSQL storage implementation with connection pooling

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tokio_util::sync::CancellationToken;

use crate::domain::storage::{Record, RecordValue, StorageExecutor};
use crate::domain::{cancellable, DomainError};

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Relation holding every logical table's records
    pub relation: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/record_cache".to_string(),
            relation: "stored_records".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }
}

/// PostgreSQL storage implementation
///
/// All logical tables share one relation keyed by `(table_name, id)`.
/// Identifier assignment runs in a transaction holding an advisory lock
/// derived from the table name, so the count read and the insert are atomic
/// with respect to other writers of the same table.
pub struct PostgresStorage {
    pool: PgPool,
    relation: String,
}

impl Debug for PostgresStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("relation", &self.relation)
            .finish()
    }
}

impl PostgresStorage {
    /// Creates a new PostgreSQL storage over an existing pool
    pub fn new(pool: PgPool, relation: impl Into<String>) -> Self {
        Self {
            pool,
            relation: relation.into(),
        }
    }

    /// Creates a new PostgreSQL storage with connection pooling
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool, config.relation.clone()))
    }

    /// Ensures the backing relation exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                table_name VARCHAR(255) NOT NULL,
                id BIGINT NOT NULL,
                value JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (table_name, id)
            )
            "#,
            self.relation
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create relation: {}", e)))?;

        Ok(())
    }

    fn decode_row(table: &str, row: &PgRow) -> Result<Record, DomainError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| DomainError::storage(format!("Failed to read record id: {}", e)))?;
        let value: RecordValue = row
            .try_get("value")
            .map_err(|e| DomainError::storage(format!("Failed to read record value: {}", e)))?;

        Ok(Record::new(table, id as u64, value))
    }
}

#[async_trait]
impl StorageExecutor for PostgresStorage {
    async fn lookup_by_id(
        &self,
        cancel: &CancellationToken,
        table: &str,
        id: u64,
    ) -> Result<Record, DomainError> {
        let query = format!(
            "SELECT id, value FROM {} WHERE table_name = $1 AND id = $2",
            self.relation
        );

        let row = cancellable(cancel, "lookup_by_id", async {
            sqlx::query(&query)
                .bind(table)
                .bind(id as i64)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to get record: {}", e)))
        })
        .await?;

        match row {
            Some(row) => Self::decode_row(table, &row),
            None => Err(DomainError::not_found(format!(
                "Record {} not found in table '{}'",
                id, table
            ))),
        }
    }

    async fn lookup_all(
        &self,
        cancel: &CancellationToken,
        table: &str,
    ) -> Result<Vec<Record>, DomainError> {
        let query = format!(
            "SELECT id, value FROM {} WHERE table_name = $1 ORDER BY id",
            self.relation
        );

        let rows = cancellable(cancel, "lookup_all", async {
            sqlx::query(&query)
                .bind(table)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to list records: {}", e)))
        })
        .await?;

        // A table only exists through its rows
        if rows.is_empty() {
            return Err(DomainError::not_found(format!("Table '{}' not found", table)));
        }

        rows.iter().map(|row| Self::decode_row(table, row)).collect()
    }

    async fn insert(
        &self,
        cancel: &CancellationToken,
        table: &str,
        value: RecordValue,
    ) -> Result<u64, DomainError> {
        let count_query = format!(
            "SELECT COUNT(*) AS count FROM {} WHERE table_name = $1",
            self.relation
        );
        let insert_query = format!(
            "INSERT INTO {} (table_name, id, value) VALUES ($1, $2, $3)",
            self.relation
        );

        // Dropping the transaction on cancellation rolls it back
        cancellable(cancel, "insert", async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(table)
                .execute(&mut *tx)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to lock table: {}", e)))?;

            let count: i64 = sqlx::query(&count_query)
                .bind(table)
                .fetch_one(&mut *tx)
                .await
                .and_then(|row| row.try_get("count"))
                .map_err(|e| DomainError::storage(format!("Failed to count records: {}", e)))?;

            let id = count + 1;

            sqlx::query(&insert_query)
                .bind(table)
                .bind(id)
                .bind(&value)
                .execute(&mut *tx)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to insert record: {}", e)))?;

            tx.commit()
                .await
                .map_err(|e| DomainError::storage(format!("Failed to commit insert: {}", e)))?;

            Ok(id as u64)
        })
        .await
    }

    async fn ping(&self, cancel: &CancellationToken) -> Result<(), DomainError> {
        cancellable(cancel, "ping", async {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map(|_| ())
                .map_err(|e| DomainError::storage(format!("PostgreSQL ping failed: {}", e)))
        })
        .await
    }
}

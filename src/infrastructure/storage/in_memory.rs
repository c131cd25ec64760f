//! In-memory storage implementation

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::storage::{Record, RecordValue, StorageExecutor};
use crate::domain::{ensure_active, DomainError};

type Table = BTreeMap<u64, Record>;

/// Thread-safe in-memory storage implementation
///
/// A single lock guards every table. `insert` holds the write lock across
/// the count read and the insert, so concurrent writers always receive
/// distinct, gap-free identifiers. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    fn table_not_found(table: &str) -> DomainError {
        DomainError::not_found(format!("Table '{}' not found", table))
    }
}

#[async_trait]
impl StorageExecutor for InMemoryStorage {
    async fn lookup_by_id(
        &self,
        cancel: &CancellationToken,
        table: &str,
        id: u64,
    ) -> Result<Record, DomainError> {
        ensure_active(cancel, "lookup_by_id")?;

        let tables = self.tables.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let rows = tables.get(table).ok_or_else(|| Self::table_not_found(table))?;

        rows.get(&id).cloned().ok_or_else(|| {
            DomainError::not_found(format!("Record {} not found in table '{}'", id, table))
        })
    }

    async fn lookup_all(
        &self,
        cancel: &CancellationToken,
        table: &str,
    ) -> Result<Vec<Record>, DomainError> {
        ensure_active(cancel, "lookup_all")?;

        let tables = self.tables.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        match tables.get(table) {
            Some(rows) if !rows.is_empty() => Ok(rows.values().cloned().collect()),
            _ => Err(Self::table_not_found(table)),
        }
    }

    async fn insert(
        &self,
        cancel: &CancellationToken,
        table: &str,
        value: RecordValue,
    ) -> Result<u64, DomainError> {
        ensure_active(cancel, "insert")?;

        let mut tables = self.tables.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let rows = tables.entry(table.to_string()).or_default();
        let id = rows.len() as u64 + 1;
        rows.insert(id, Record::new(table, id, value));

        Ok(id)
    }
}

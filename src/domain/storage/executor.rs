//! Storage executor trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::DomainError;

use super::record::{Record, RecordValue};

/// Table/identifier oriented storage with swappable backends
///
/// Tables are created lazily by the first insert and no operation removes
/// records, so a table that exists always holds at least one record. Both
/// lookups report a table that was never written as [`DomainError::NotFound`];
/// a backend that finds a table with zero rows reports it the same way.
#[async_trait]
pub trait StorageExecutor: Send + Sync + Debug {
    /// Retrieves a single record, failing with `NotFound` if the table or id is absent
    async fn lookup_by_id(
        &self,
        cancel: &CancellationToken,
        table: &str,
        id: u64,
    ) -> Result<Record, DomainError>;

    /// Retrieves every record of a table in ascending id order
    async fn lookup_all(
        &self,
        cancel: &CancellationToken,
        table: &str,
    ) -> Result<Vec<Record>, DomainError>;

    /// Stores a value and returns its identifier
    ///
    /// The identifier is `count(table) + 1`, computed atomically with the
    /// insert. Not idempotent: calling twice stores two records.
    async fn insert(
        &self,
        cancel: &CancellationToken,
        table: &str,
        value: RecordValue,
    ) -> Result<u64, DomainError>;

    /// Checks that the backend is reachable
    async fn ping(&self, _cancel: &CancellationToken) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock storage for testing
    #[derive(Debug, Default)]
    pub struct MockStorage {
        tables: Mutex<HashMap<String, BTreeMap<u64, Record>>>,
        error: Mutex<Option<String>>,
        lookups: AtomicUsize,
    }

    impl MockStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_record(self, table: &str, value: RecordValue) -> Self {
            {
                let mut tables = self.tables.lock().unwrap();
                let rows = tables.entry(table.to_string()).or_default();
                let id = rows.len() as u64 + 1;
                rows.insert(id, Record::new(table, id, value));
            }
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            self.fail_with(error);
            self
        }

        /// Makes every following call fail, simulating an unreachable backend
        pub fn fail_with(&self, error: impl Into<String>) {
            *self.error.lock().unwrap() = Some(error.into());
        }

        /// Number of lookup calls received so far
        pub fn lookup_calls(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::storage(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StorageExecutor for MockStorage {
        async fn lookup_by_id(
            &self,
            _cancel: &CancellationToken,
            table: &str,
            id: u64,
        ) -> Result<Record, DomainError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.check_error()?;

            self.tables
                .lock()
                .unwrap()
                .get(table)
                .and_then(|rows| rows.get(&id))
                .cloned()
                .ok_or_else(|| DomainError::not_found(format!("Record {}/{} not found", table, id)))
        }

        async fn lookup_all(
            &self,
            _cancel: &CancellationToken,
            table: &str,
        ) -> Result<Vec<Record>, DomainError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.check_error()?;

            self.tables
                .lock()
                .unwrap()
                .get(table)
                .map(|rows| rows.values().cloned().collect())
                .ok_or_else(|| DomainError::not_found(format!("Table '{}' not found", table)))
        }

        async fn insert(
            &self,
            _cancel: &CancellationToken,
            table: &str,
            value: RecordValue,
        ) -> Result<u64, DomainError> {
            self.check_error()?;

            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_string()).or_default();
            let id = rows.len() as u64 + 1;
            rows.insert(id, Record::new(table, id, value));
            Ok(id)
        }

        async fn ping(&self, _cancel: &CancellationToken) -> Result<(), DomainError> {
            self.check_error()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde_json::json;

        #[tokio::test]
        async fn test_mock_storage_insert_and_lookup() {
            let storage = MockStorage::new();
            let token = CancellationToken::new();

            let id = storage.insert(&token, "records", json!("A")).await.unwrap();
            assert_eq!(id, 1);

            let record = storage.lookup_by_id(&token, "records", 1).await.unwrap();
            assert_eq!(record.value, json!("A"));
            assert_eq!(storage.lookup_calls(), 1);
        }

        #[tokio::test]
        async fn test_mock_storage_with_error() {
            let storage = MockStorage::new()
                .with_record("records", json!("A"))
                .with_error("Simulated storage error");
            let token = CancellationToken::new();

            let result = storage.lookup_all(&token, "records").await;
            assert!(matches!(result, Err(DomainError::Storage { .. })));
        }
    }
}

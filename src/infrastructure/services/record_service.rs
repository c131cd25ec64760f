//! Record service - cache-aside reads with invalidation on write
//!
//! Reads check the aggregate cache entry first, fall back to storage on a
//! miss and write the serialized result back. Writes insert into storage and
//! then delete the aggregate entry so the next read repopulates it.
//!
//! The write is two independent steps, not a transaction. If the insert
//! succeeds and the invalidation fails, the record is durable but a
//! previously cached aggregate keeps hiding it until the entry is removed.
//! That window is accepted: the caller is told the write failed, and the
//! insert is never rolled back or retried.
//!
//! Once the insert is durable the invalidation runs on its own task under a
//! token nothing cancels, so request cancellation, client disconnects and
//! shutdown cannot leave a committed record hidden behind a stale list.
//!
//! A reader that loaded records before a concurrent invalidation must not
//! publish them afterwards. [`ListInvalidation`] orders the two: the reader
//! captures a generation before touching storage and writes back only if no
//! invalidation happened since. This holds for every service sharing one
//! `ListInvalidation`, i.e. one process. Several processes sharing a Redis
//! cache can still race a write-back against another process's
//! invalidation; that window lasts until the next successful insert.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::domain::{
    CacheExecutor, DomainError, Record, RecordValue, RepositoryProvider, RetryPolicy,
};

/// Table every record is written to
pub const RECORDS_TABLE: &str = "records";

/// Cache key of the serialized record list
pub const ALL_RECORDS_KEY: &str = "all-records";

/// Orders write-backs of the cached record list against invalidations
///
/// Invalidations bump the generation and delete the entry while holding the
/// lock; write-backs compare the generation and set the entry while holding
/// the same lock. An invalidation therefore either deletes a stale
/// write-back or makes it skip.
#[derive(Debug, Default)]
pub struct ListInvalidation {
    generation: AtomicU64,
    lock: Mutex<()>,
}

impl ListInvalidation {
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    async fn invalidate(
        &self,
        cache: &dyn CacheExecutor,
        retry: &RetryPolicy,
    ) -> Result<(), DomainError> {
        let token = CancellationToken::new();
        let token = &token;

        let _held = self.lock.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);

        retry
            .run(token, "cache delete", move || cache.delete(token, ALL_RECORDS_KEY))
            .await
    }

    async fn write_back(
        &self,
        observed: u64,
        cancel: &CancellationToken,
        cache: &dyn CacheExecutor,
        retry: &RetryPolicy,
        blob: Bytes,
    ) -> Result<bool, DomainError> {
        let _held = self.lock.lock().await;
        if self.generation() != observed {
            return Ok(false);
        }

        retry
            .run(cancel, "cache set", move || {
                cache.set(cancel, ALL_RECORDS_KEY, blob.clone())
            })
            .await?;
        Ok(true)
    }
}

/// Serves record reads and writes through a [`RepositoryProvider`]
#[derive(Debug, Clone)]
pub struct RecordService {
    provider: RepositoryProvider,
    retry: RetryPolicy,
    invalidation: Arc<ListInvalidation>,
}

impl RecordService {
    /// Creates a record service. Services serving the same cache must share
    /// `invalidation`.
    pub fn new(
        provider: RepositoryProvider,
        retry: RetryPolicy,
        invalidation: Arc<ListInvalidation>,
    ) -> Self {
        Self {
            provider,
            retry,
            invalidation,
        }
    }

    /// Stores a record and invalidates the cached record list
    ///
    /// Returns the new record's identifier. Fails if either step fails; a
    /// failure after the insert leaves the record stored.
    pub async fn insert_record(
        &self,
        cancel: &CancellationToken,
        value: RecordValue,
    ) -> Result<u64, DomainError> {
        let storage = self.provider.storage();

        // Inserts are not idempotent, so no retry here
        let id = storage
            .insert(cancel, RECORDS_TABLE, value)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to insert record"))?;

        debug!(id, table = RECORDS_TABLE, "Record inserted");

        let cache = Arc::clone(self.provider.cache());
        let retry = self.retry.clone();
        let invalidation = Arc::clone(&self.invalidation);

        tokio::spawn(async move { invalidation.invalidate(cache.as_ref(), &retry).await })
            .await
            .map_err(|e| DomainError::internal(format!("Cache invalidation task failed: {}", e)))?
            .inspect_err(|e| {
                error!(
                    id,
                    key = ALL_RECORDS_KEY,
                    error = %e,
                    "Record stored but cache invalidation failed"
                )
            })?;

        Ok(id)
    }

    /// Returns the serialized record list, from cache when present
    ///
    /// A cache hit is returned verbatim. Cache failures only cost the fast
    /// path; storage failures and `NotFound` are returned to the caller.
    pub async fn list_records(&self, cancel: &CancellationToken) -> Result<Bytes, DomainError> {
        let storage = self.provider.storage();
        let cache = self.provider.cache();
        let observed = self.invalidation.generation();

        match self
            .retry
            .run(cancel, "cache get", move || cache.get(cancel, ALL_RECORDS_KEY))
            .await
        {
            Ok(Some(blob)) => {
                debug!(key = ALL_RECORDS_KEY, bytes = blob.len(), "Cache hit");
                return Ok(blob);
            }
            Ok(None) => debug!(key = ALL_RECORDS_KEY, "Cache miss"),
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => warn!(error = %e, "Cache lookup failed, reading from storage"),
        }

        let records = self
            .retry
            .run(cancel, "lookup_all", move || storage.lookup_all(cancel, RECORDS_TABLE))
            .await?;

        let blob = encode_records(&records)?;

        match self
            .invalidation
            .write_back(observed, cancel, cache.as_ref(), &self.retry, blob.clone())
            .await
        {
            Ok(true) => {}
            Ok(false) => debug!(
                key = ALL_RECORDS_KEY,
                "Record list invalidated while loading, skipping write-back"
            ),
            Err(e) => warn!(error = %e, "Failed to repopulate record cache"),
        }

        Ok(blob)
    }

    /// Looks up a single record by identifier, bypassing the cache
    pub async fn get_record(
        &self,
        cancel: &CancellationToken,
        id: u64,
    ) -> Result<Record, DomainError> {
        let storage = self.provider.storage();

        self.retry
            .run(cancel, "lookup_by_id", move || {
                storage.lookup_by_id(cancel, RECORDS_TABLE, id)
            })
            .await
    }
}

fn encode_records(records: &[Record]) -> Result<Bytes, DomainError> {
    serde_json::to_vec(records)
        .map(Bytes::from)
        .map_err(|e| DomainError::serialization(format!("Failed to encode records: {}", e)))
}

//! Domain layer - executor contracts, provider and errors

pub mod cache;
pub mod cancellation;
pub mod error;
pub mod provider;
pub mod retry;
pub mod storage;

pub use cache::CacheExecutor;
pub use cancellation::{cancellable, ensure_active};
pub use error::DomainError;
pub use provider::{CacheHandle, RepositoryProvider, StorageHandle};
pub use retry::RetryPolicy;
pub use storage::{Record, RecordValue, StorageExecutor};

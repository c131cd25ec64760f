//! Storage domain - table/identifier persistence abstraction

mod executor;
mod record;

pub use executor::StorageExecutor;
pub use record::{Record, RecordValue};

#[cfg(test)]
pub use executor::mock::MockStorage;

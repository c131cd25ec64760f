//! Cache domain - key to blob caching abstraction

mod executor;

pub use executor::CacheExecutor;

#[cfg(test)]
pub use executor::mock::MockCache;

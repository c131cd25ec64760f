//! Cache infrastructure - Cache executor implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::InMemoryCache;
pub use redis::{RedisCache, RedisCacheConfig};

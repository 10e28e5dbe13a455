//! TTL store implementations - Redis and in-memory fallback.

mod memory;

pub use memory::InMemoryStore;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisStore};

#[cfg(test)]
mod tests;

//! # LearnShare Infrastructure
//!
//! Concrete implementations of the ports defined in `learnshare-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `auth` - JWT + Argon2 authentication
//! - `redis` - Redis-backed TTL store

pub mod notify;
pub mod repository;
pub mod store;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use notify::LogCodeSender;
pub use repository::InMemoryUserRepository;
pub use store::InMemoryStore;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use store::{RedisConfig, RedisStore};

//! # LearnShare Core
//!
//! The domain layer of the LearnShare backend.
//! This crate contains domain types, the ports infrastructure must implement,
//! and the ephemeral caches built on top of the TTL store port. It has zero
//! infrastructure dependencies: every backend is injected as a trait object.

pub mod domain;
pub mod ephemeral;
pub mod error;
pub mod ports;

pub use error::{CacheError, DomainError};

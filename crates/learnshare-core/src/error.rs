//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

use crate::ports::StoreError;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Unauthorized access")]
    Unauthorized,
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Errors raised by the ephemeral caches.
///
/// `NotFound` is only produced where an absent entry is a failure for the
/// caller (verification codes). Revocation, rate-limit and profile lookups
/// report absence through their `Ok` value instead.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("No pending entry under {key}")]
    NotFound { key: String },

    #[error("Malformed entry under {key}: {reason}")]
    Format { key: String, reason: String },

    #[error("Supplied code does not match the pending code")]
    Mismatch,

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Corrupted record under {key}: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CacheError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }

    /// True when the backing store could not answer (connection, timeout,
    /// backend failure). Authentication paths must deny in this case.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::Store(_))
    }
}

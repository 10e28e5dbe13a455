//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod notifier;
mod repository;
mod store;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use notifier::{CodeSender, NotifyError};
pub use repository::{BaseRepository, UserRepository};
pub use store::{StoreError, TtlStore, effective_ttl};

#[cfg(test)]
pub use store::MockTtlStore;

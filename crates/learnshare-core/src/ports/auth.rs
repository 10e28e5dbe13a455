//! Authentication and authorization ports.

use std::time::Duration;

use uuid::Uuid;

/// Claims carried by access tokens.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub exp: i64,
}

/// Access token issuance and validation.
pub trait TokenService: Send + Sync {
    /// Generate an access token for a user.
    fn generate_token(
        &self,
        user_id: Uuid,
        email: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Maximum lifetime of any token this service issues.
    ///
    /// Revocation marks must outlive this, otherwise a revoked token becomes
    /// valid again once its mark expires.
    fn token_lifetime(&self) -> Duration;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;

    /// Do the work of a failed `verify` when there is no hash to check
    /// (unknown account). Always `false`.
    fn verify_decoy(&self, password: &str) -> bool;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Hashing error: {0}")]
    HashingError(String),

    /// The revocation registry could not be consulted; the request is denied.
    #[error("Authentication backend unavailable: {0}")]
    Unavailable(String),
}

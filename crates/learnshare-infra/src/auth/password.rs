//! Argon2 password hashing implementation.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use learnshare_core::ports::{AuthError, PasswordService};

/// Argon2id password service with default parameters.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
    /// Hash checked when the account does not exist, so a login for an
    /// unknown email costs the same as one with a wrong password.
    decoy_hash: Option<String>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        let argon2 = Argon2::default();
        let salt = SaltString::generate(&mut OsRng);
        let decoy_hash = argon2
            .hash_password(b"learnshare-decoy-password", &salt)
            .map(|h| h.to_string())
            .ok();

        Self { argon2, decoy_hash }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn verify_decoy(&self, password: &str) -> bool {
        if let Some(hash) = &self.decoy_hash {
            let _ = self.verify(password, hash);
        }
        false
    }
}

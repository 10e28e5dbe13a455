//! Account workflows: verification codes, registration, sessions, profile.
//!
//! Every workflow here talks to the ephemeral caches through
//! [`EphemeralStores`] and to the authoritative user store through
//! [`UserRepository`]. Checks that guard authentication fail closed: if a
//! cache cannot answer, the request is refused.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use learnshare_core::domain::{
    User, UserProfile, validate_email, validate_password, validate_username,
};
use learnshare_core::ephemeral::{EphemeralStores, generate_code};
use learnshare_core::error::{CacheError, DomainError, RepoError};
use learnshare_core::ports::{
    AuthError, BaseRepository, CodeSender, NotifyError, PasswordService, TokenClaims, TokenService,
    UserRepository,
};

/// Account workflow failures.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// Missing, expired or wrong code. Deliberately not more specific.
    #[error("Verification code incorrect or expired")]
    InvalidCode,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Too many requests, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Email already registered")]
    EmailTaken,

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// A freshly issued access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: Duration,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    caches: EphemeralStores,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
    sender: Arc<dyn CodeSender>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        caches: EphemeralStores,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        sender: Arc<dyn CodeSender>,
    ) -> Self {
        Self {
            users,
            caches,
            tokens,
            passwords,
            sender,
        }
    }

    /// Issue and deliver a code to `email`, at most once per window per
    /// client address.
    pub async fn send_code(&self, email: &str, client_addr: &str) -> Result<(), AccountError> {
        validate_email(email)?;

        let limiter = &self.caches.rate_limiter;
        if limiter.is_limited(client_addr).await? {
            tracing::info!(client = %client_addr, "Verification code request rate limited");
            return Err(AccountError::RateLimited {
                retry_after: limiter.window(),
            });
        }

        let code = generate_code();
        self.caches.codes.issue(email, &code).await?;

        if let Err(e) = self.sender.send_code(email, &code).await {
            tracing::error!(email = %email, error = %e, "Failed to deliver verification code");
            if let Err(e) = self.caches.codes.invalidate(email).await {
                tracing::warn!(email = %email, error = %e, "Failed to drop undelivered code");
            }
            return Err(e.into());
        }

        limiter.mark(client_addr).await?;
        tracing::info!(email = %email, "Verification code sent");
        Ok(())
    }

    /// Register an account.
    ///
    /// With a `code` the email is proven on the spot and the account starts
    /// active. Without one the account starts inactive until
    /// [`AccountService::verify_email`] succeeds.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        code: Option<&str>,
    ) -> Result<(User, IssuedToken), AccountError> {
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        if let Some(code) = code {
            self.check_code(email, code).await?;
        }

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let password_hash = self.passwords.hash(password)?;
        let mut user = User::new(username.to_string(), email.to_string(), password_hash);
        if code.is_some() {
            user.activate();
        }
        let user = self.users.save(user).await?;

        if code.is_some() {
            self.consume_code(email).await;
        }
        self.refresh_profile(&user).await;

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok((user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AccountError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            self.passwords.verify_decoy(password);
            return Err(AccountError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash)? {
            return Err(AccountError::InvalidCredentials);
        }

        self.issue_token(&user)
    }

    /// Revoke the token presented with the request.
    pub async fn logout(&self, token: &str) -> Result<(), AccountError> {
        self.caches.revocations.revoke(token).await?;
        tracing::info!("Session token revoked");
        Ok(())
    }

    /// Validate a bearer token and make sure it has not been revoked.
    ///
    /// A registry failure is returned as [`AuthError::Unavailable`]; it never
    /// lets the token through.
    pub async fn authenticate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.tokens.validate_token(token)?;

        match self.caches.revocations.is_revoked(token).await {
            Ok(false) => Ok(claims),
            Ok(true) => Err(AuthError::TokenRevoked),
            Err(e) => {
                tracing::error!(error = %e, "Revocation check failed, denying request");
                Err(AuthError::Unavailable(e.to_string()))
            }
        }
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        validate_password(new_password)?;
        self.check_code(email, code).await?;

        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AccountError::InvalidCode)?;

        user.change_password_hash(self.passwords.hash(new_password)?);
        let user = self.users.save(user).await?;

        self.consume_code(email).await;
        self.refresh_profile(&user).await;
        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    /// Move `user_id` to `new_email`, proven by a code sent to the new address.
    pub async fn update_email(
        &self,
        user_id: Uuid,
        new_email: &str,
        code: &str,
    ) -> Result<User, AccountError> {
        validate_email(new_email)?;
        self.check_code(new_email, code).await?;

        if let Some(existing) = self.users.find_by_email(new_email).await? {
            if existing.id != user_id {
                return Err(AccountError::EmailTaken);
            }
        }

        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound(user_id))?;
        user.change_email(new_email.to_string());
        let user = self.users.save(user).await?;

        self.consume_code(new_email).await;
        self.refresh_profile(&user).await;
        Ok(user)
    }

    /// Prove the account email of `user_id` with `code` and activate it.
    pub async fn verify_email(
        &self,
        user_id: Uuid,
        email: &str,
        code: &str,
    ) -> Result<UserProfile, AccountError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound(user_id))?;

        if !user.email.eq_ignore_ascii_case(email) {
            return Err(DomainError::Validation(
                "Email does not belong to this account".to_string(),
            )
            .into());
        }

        self.check_code(&user.email, code).await?;

        if !user.is_active() {
            user.activate();
            user = self.users.save(user).await?;
            tracing::info!(user_id = %user.id, "Email verified, account activated");
        }

        self.consume_code(&user.email).await;
        self.refresh_profile(&user).await;
        Ok(UserProfile::from(&user))
    }

    /// Read-through profile lookup: cache first, repository on miss.
    ///
    /// A cache that is down or holds a corrupted record only costs a
    /// repository read; profile reads are not an authentication decision.
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, AccountError> {
        match self.caches.profiles.get(user_id).await {
            Ok(Some(profile)) => return Ok(profile),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Profile cache read failed, using repository");
            }
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound(user_id))?;
        self.refresh_profile(&user).await;
        Ok(UserProfile::from(&user))
    }

    async fn check_code(&self, email: &str, code: &str) -> Result<(), AccountError> {
        match self.caches.codes.verify(email, code).await {
            Ok(()) => Ok(()),
            Err(CacheError::NotFound { .. } | CacheError::Mismatch) => {
                Err(AccountError::InvalidCode)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Invalidate a code after the workflow it guarded has succeeded.
    async fn consume_code(&self, email: &str) {
        if let Err(e) = self.caches.codes.invalidate(email).await {
            // The code stays usable until its TTL runs out.
            tracing::error!(email = %email, error = %e, "Failed to invalidate used verification code");
        }
    }

    async fn refresh_profile(&self, user: &User) {
        if let Err(e) = self
            .caches
            .profiles
            .put(user.id, &UserProfile::from(user), self.caches.profile_ttl)
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to refresh profile cache");
        }
    }

    fn issue_token(&self, user: &User) -> Result<IssuedToken, AccountError> {
        let access_token =
            self.tokens
                .generate_token(user.id, &user.email, vec!["user".to_string()])?;
        Ok(IssuedToken {
            access_token,
            expires_in: self.tokens.token_lifetime(),
        })
    }
}

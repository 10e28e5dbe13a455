//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use learnshare_core::error::{DomainError, RepoError};
use learnshare_shared::ErrorResponse;
use std::fmt;

use crate::services::AccountError;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Conflict(String),
    TooManyRequests { retry_after_secs: u64 },
    /// A backing service is down; the request was refused rather than guessed.
    Unavailable(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::TooManyRequests { retry_after_secs } => {
                write!(f, "Too many requests, retry after {}s", retry_after_secs)
            }
            AppError::Unavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized(),
            AppError::Conflict(detail) => ErrorResponse::new(409, "Conflict").with_detail(detail),
            AppError::TooManyRequests { retry_after_secs } => {
                let mut response = HttpResponse::build(self.status_code());
                response.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
                return response.json(ErrorResponse::too_many_requests(*retry_after_secs));
            }
            AppError::Unavailable(detail) => {
                tracing::error!("Service unavailable: {}", detail);
                ErrorResponse::service_unavailable()
            }
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Unauthorized => AppError::Unauthorized,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Repository connection error: {}", msg);
                AppError::Internal("Repository error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Repository query error: {}", msg);
                AppError::Internal("Repository error".to_string())
            }
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(e) => e.into(),
            AccountError::InvalidCode => {
                AppError::BadRequest("verification code incorrect or expired".to_string())
            }
            AccountError::InvalidCredentials => AppError::Unauthorized,
            AccountError::RateLimited { retry_after } => AppError::TooManyRequests {
                retry_after_secs: retry_after.as_secs().max(1),
            },
            AccountError::EmailTaken => AppError::Conflict("Email already registered".to_string()),
            AccountError::UserNotFound(id) => AppError::NotFound(format!("User {} not found", id)),
            AccountError::Cache(e) if e.is_unavailable() => AppError::Unavailable(e.to_string()),
            AccountError::Cache(e) => AppError::Internal(e.to_string()),
            AccountError::Repo(e) => e.into(),
            AccountError::Auth(e) => AppError::Internal(e.to_string()),
            AccountError::Notify(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

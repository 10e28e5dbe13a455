//! Authentication extractor.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;

use learnshare_core::ports::{AuthError, TokenClaims};
use learnshare_shared::ErrorResponse;

use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Validates the access token and checks it against the revocation
/// registry. Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub email: String,
    /// The raw token, needed to revoke it on logout.
    pub token: String,
}

impl Identity {
    fn from_claims(claims: TokenClaims, token: String) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            token,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match &self.0 {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::TokenRevoked
            | AuthError::MissingAuth
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::TokenRevoked => ErrorResponse::new(401, "Token Revoked")
                .with_detail("This token has been logged out. Please login again."),
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::InvalidCredentials => ErrorResponse::unauthorized(),
            AuthError::InsufficientPermissions => ErrorResponse::new(403, "Forbidden"),
            AuthError::Unavailable(_) => ErrorResponse::service_unavailable(),
            AuthError::HashingError(_) => ErrorResponse::internal_error(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

/// Pull the token out of an Authorization header value.
///
/// Accepts `Bearer <token>` (scheme is case-insensitive) or the bare token.
pub fn parse_authorization(value: &str) -> Result<&str, AuthError> {
    let value = value.trim_start();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => {
            return Err(AuthError::InvalidToken(
                "Expected Bearer token".to_string(),
            ));
        }
        None => value.trim_end(),
    };

    if token.is_empty() {
        return Err(AuthError::MissingAuth);
    }
    Ok(token)
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingAuth)
            .and_then(|value| {
                value
                    .to_str()
                    .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))
            })
            .and_then(parse_authorization)
            .map(str::to_owned);

        Box::pin(async move {
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Err(AuthenticationError(AuthError::Unavailable(
                    "Server configuration error".to_string(),
                )));
            };
            let token = token.map_err(AuthenticationError)?;

            let claims = state
                .accounts
                .authenticate(&token)
                .await
                .map_err(AuthenticationError)?;
            Ok(Identity::from_claims(claims, token))
        })
    }
}

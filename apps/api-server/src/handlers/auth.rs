//! Authentication handlers.

use actix_web::{HttpRequest, HttpResponse, web};

use learnshare_shared::ApiResponse;
use learnshare_shared::dto::{
    AuthResponse, LoginRequest, RegisterUserRequest, ResetPasswordRequest, SendCodeRequest,
};

use super::users::user_response;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::services::IssuedToken;
use crate::state::AppState;

fn auth_response(token: IssuedToken) -> AuthResponse {
    AuthResponse {
        access_token: token.access_token,
        token_type: "Bearer".to_string(),
        expires_in: token.expires_in.as_secs(),
    }
}

/// Source key for rate limiting.
///
/// Forwarding headers are client-controlled, so they are only honoured when
/// the deployment says a proxy rewrites them. Otherwise the socket peer IP
/// is used; the port is dropped so reconnecting does not reset the window.
fn client_addr(req: &HttpRequest, trust_proxy_headers: bool) -> Option<String> {
    if trust_proxy_headers {
        if let Some(addr) = req.connection_info().realip_remote_addr() {
            return Some(addr.to_owned());
        }
    }
    req.peer_addr().map(|addr| addr.ip().to_string())
}

/// POST /api/auth/code
///
/// Rate limited per client address.
pub async fn send_code(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<SendCodeRequest>,
) -> AppResult<HttpResponse> {
    let client_addr = client_addr(&req, state.trust_proxy_headers)
        .ok_or_else(|| AppError::BadRequest("Client address unknown".to_string()))?;

    state.accounts.send_code(&body.email, &client_addr).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Verification code sent")))
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let (user, token) = state
        .accounts
        .register(&req.username, &req.email, &req.password, req.code.as_deref())
        .await?;

    tracing::debug!(user_id = %user.id, "Registration complete");
    Ok(HttpResponse::Created().json(auth_response(token)))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let token = state.accounts.login(&body.email, &body.password).await?;
    Ok(HttpResponse::Ok().json(auth_response(token)))
}

/// POST /api/auth/logout - Protected route
pub async fn logout(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    state.accounts.logout(&identity.token).await?;
    tracing::info!(user_id = %identity.user_id, email = %identity.email, "User logged out");
    Ok(HttpResponse::Ok().json(ApiResponse::message("Logged out")))
}

/// POST /api/auth/password/reset
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    state
        .accounts
        .reset_password(&req.email, &req.code, &req.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Password updated")))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user_response(&user))))
}

//! User profile handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use learnshare_core::domain::UserProfile;
use learnshare_shared::ApiResponse;
use learnshare_shared::dto::{UpdateEmailRequest, UserResponse, VerifyEmailRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

pub(super) fn user_response(user: &UserProfile) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        status: user.status.as_str().to_string(),
        created_at: user.created_at.to_rfc3339(),
    }
}

/// GET /api/users/{id}
pub async fn get_user(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user_response(&user))))
}

/// PUT /api/users/me/email
pub async fn update_email(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateEmailRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .accounts
        .update_email(identity.user_id, &req.new_email, &req.code)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(user_response(&UserProfile::from(&user)))))
}

/// POST /api/users/me/verify
pub async fn verify_email(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<VerifyEmailRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let profile = state
        .accounts
        .verify_email(identity.user_id, &req.email, &req.code)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(user_response(&profile))))
}

//! Authentication: signup, login, logout, and the bearer-token middleware
//!
//! Protected routes run behind `auth_middleware`, which resolves the
//! `Authorization: Bearer` token to a profile and stores it in request
//! extensions. Handlers receive the caller via `Extension<UserProfile>`,
//! so authorization decisions always happen server-side.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use acapella_common::db::models::UserProfile;

use crate::db::{sessions, users};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// POST /api/auth/signup
///
/// Creates the account, synthesizes a unique username, and opens a session.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = users::create_user(
        &state.db,
        &req.email,
        &req.password,
        req.display_name.as_deref(),
        &state.config.master_admin_emails,
    )
    .await?;
    let token = sessions::create_session(&state.db, &user.uid).await?;

    info!("New account: {} ({})", user.username, user.uid);
    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = users::authenticate(&state.db, &req.email, &req.password).await?;
    let token = sessions::create_session(&state.db, &user.uid).await?;
    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/logout
///
/// Deletes the presented session. Idempotent.
pub async fn logout(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(token) = bearer_token(&request) {
        sessions::delete_session(&state.db, &token).await?;
    }
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Bearer-token middleware for protected routes. Resolves the token to a
/// profile and makes it available to handlers as `Extension<UserProfile>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token."))?;

    let uid = sessions::lookup_session(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session."))?;

    let profile = users::get_by_uid(&state.db, &uid)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session."))?;

    request.extensions_mut().insert(profile);
    Ok(next.run(request).await)
}

/// GET /api/me
pub async fn me(Extension(user): Extension<UserProfile>) -> Json<UserProfile> {
    Json(user)
}

/// Admin gate shared by catalog write handlers.
pub fn require_catalog_admin(user: &UserProfile) -> Result<(), ApiError> {
    if user.role.can_manage_catalog() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin privileges required."))
    }
}

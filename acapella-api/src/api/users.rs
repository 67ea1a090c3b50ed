//! Profile endpoints
//!
//! Public profiles are fetched by username (the URL slug). Edits only ever
//! apply to the authenticated caller, and role changes require master admin.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use acapella_common::db::models::{Role, UserProfile};
use acapella_common::{time::now_ms, username};

use crate::db::{follows, users};
use crate::error::ApiError;
use crate::AppState;

/// GET /api/users/:username
pub async fn get_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    users::get_by_username(&state.db, &name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", name)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub socials: Option<Value>,
    pub favorite_song_ids: Option<Vec<String>>,
    pub favorite_album_ids: Option<Vec<String>>,
}

/// PATCH /api/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let updated = users::update_profile(
        &state.db,
        &user.uid,
        users::ProfileUpdate {
            display_name: req.display_name,
            username: req.username.map(|u| u.to_lowercase()),
            photo_url: req.photo_url,
            bio: req.bio,
            socials: req.socials,
            favorite_song_ids: req.favorite_song_ids,
            favorite_album_ids: req.favorite_album_ids,
        },
    )
    .await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UsernameCheckResponse {
    pub username: String,
    pub available: bool,
}

/// GET /api/username-check?username=...
///
/// Advisory only; the UNIQUE constraint is the real arbiter at write time.
pub async fn check_username(
    State(state): State<AppState>,
    Query(q): Query<UsernameQuery>,
) -> Result<Json<UsernameCheckResponse>, ApiError> {
    let name = q.username.to_lowercase();
    let available = match username::validate(&name) {
        Ok(()) => users::username_available(&state.db, &name).await?,
        Err(_) => false,
    };
    Ok(Json(UsernameCheckResponse {
        username: name,
        available,
    }))
}

/// GET /api/users/:username/followers
pub async fn list_followers(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let user = users::get_by_username(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", name)))?;
    Ok(Json(follows::followers_of(&state.db, &user.uid).await?))
}

/// GET /api/users/:username/following
pub async fn list_following(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let user = users::get_by_username(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", name)))?;
    Ok(Json(follows::following_of(&state.db, &user.uid).await?))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

/// POST /api/admin/users/:uid/role
///
/// Master admin only.
pub async fn set_role(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Path(uid): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if caller.role != Role::MasterAdmin {
        return Err(ApiError::forbidden("Master admin privileges required."));
    }
    let role =
        Role::parse(&req.role).ok_or_else(|| ApiError::invalid(format!("Unknown role: {}", req.role)))?;

    let updated = sqlx::query("UPDATE users SET role = ? WHERE uid = ?")
        .bind(role.as_str())
        .bind(&uid)
        .execute(&state.db)
        .await
        .map_err(acapella_common::Error::from)?;
    if updated.rows_affected() == 0 {
        return Err(ApiError::not_found(format!("User not found: {}", uid)));
    }

    info!("Role change: {} -> {} (by {})", uid, role.as_str(), caller.uid);
    users::get_by_uid(&state.db, &uid)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", uid)))
}

#[derive(Debug, Deserialize)]
pub struct CuratorSubscribeRequest {
    pub plan: String,
}

const CURATOR_PLAN_DAYS: &[(&str, i64)] = &[("monthly", 30), ("annual", 365)];

/// POST /api/curator/subscribe
///
/// Marks the caller a curator for the plan's duration. Payment handling is
/// out of scope; this records the membership only.
pub async fn curator_subscribe(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(req): Json<CuratorSubscribeRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let days = CURATOR_PLAN_DAYS
        .iter()
        .find(|(plan, _)| *plan == req.plan)
        .map(|(_, days)| *days)
        .ok_or_else(|| ApiError::invalid(format!("Unknown plan: {}", req.plan)))?;

    let expires_at = now_ms() + days * acapella_common::time::DAY_MS;
    let updated = users::set_curator(&state.db, &user.uid, &req.plan, expires_at).await?;
    Ok(Json(updated))
}

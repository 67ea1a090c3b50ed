//! Follow endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use acapella_common::db::models::UserProfile;

use crate::db::follows;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub following: bool,
    pub changed: bool,
}

/// POST /api/follows/:uid
pub async fn follow(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(uid): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let changed = follows::follow(&state.db, &user.uid, &uid).await?;
    Ok(Json(FollowResponse {
        following: true,
        changed,
    }))
}

/// DELETE /api/follows/:uid
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(uid): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let changed = follows::unfollow(&state.db, &user.uid, &uid).await?;
    Ok(Json(FollowResponse {
        following: false,
        changed,
    }))
}

#[derive(Debug, Serialize)]
pub struct FollowStatusResponse {
    pub following: bool,
}

/// GET /api/follows/:uid
pub async fn follow_status(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(uid): Path<String>,
) -> Result<Json<FollowStatusResponse>, ApiError> {
    let following = follows::is_following(&state.db, &user.uid, &uid).await?;
    Ok(Json(FollowStatusResponse { following }))
}

//! Playlist endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use acapella_common::db::models::{Playlist, UserProfile};

use crate::db::playlists::{self, PlaylistInput};
use crate::db::users;
use crate::error::ApiError;
use crate::AppState;

/// POST /api/playlists
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(input): Json<PlaylistInput>,
) -> Result<Json<Playlist>, ApiError> {
    Ok(Json(
        playlists::create_playlist(&state.db, &user.uid, &input).await?,
    ))
}

/// PUT /api/playlists/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
    Json(input): Json<PlaylistInput>,
) -> Result<Json<Playlist>, ApiError> {
    Ok(Json(
        playlists::update_playlist(&state.db, &id, &user.uid, &input).await?,
    ))
}

/// DELETE /api/playlists/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    playlists::delete_playlist(&state.db, &id, &user.uid).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// GET /api/playlists/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Playlist>, ApiError> {
    playlists::get_playlist(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Playlist not found: {}", id)))
}

/// GET /api/users/:username/playlists
pub async fn list_by_user(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Playlist>>, ApiError> {
    let user = users::get_by_username(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", name)))?;
    Ok(Json(playlists::playlists_by_user(&state.db, &user.uid).await?))
}

//! Like endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use acapella_common::db::models::{EntityKind, Like, UserProfile};

use crate::db::{likes, users};
use crate::error::ApiError;
use crate::AppState;

fn parse_kind(raw: &str) -> Result<EntityKind, ApiError> {
    EntityKind::parse(raw).ok_or_else(|| ApiError::invalid(format!("Unknown entity type: {}", raw)))
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub changed: bool,
}

/// POST /api/likes/:entity_type/:entity_id
pub async fn like(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> Result<Json<LikeResponse>, ApiError> {
    let kind = parse_kind(&entity_type)?;
    let changed = likes::like(&state.db, &user.uid, kind, &entity_id).await?;
    Ok(Json(LikeResponse {
        liked: true,
        changed,
    }))
}

/// DELETE /api/likes/:entity_type/:entity_id
pub async fn unlike(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> Result<Json<LikeResponse>, ApiError> {
    let kind = parse_kind(&entity_type)?;
    let changed = likes::unlike(&state.db, &user.uid, kind, &entity_id).await?;
    Ok(Json(LikeResponse {
        liked: false,
        changed,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UserLikesQuery {
    pub entity_type: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/users/:username/likes
pub async fn user_likes(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<UserLikesQuery>,
) -> Result<Json<Vec<Like>>, ApiError> {
    let user = users::get_by_username(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", name)))?;

    let kind = q.entity_type.as_deref().map(parse_kind).transpose()?;
    let limit = crate::pagination::clamp_limit(q.limit);
    Ok(Json(
        likes::likes_of_user(&state.db, &user.uid, kind, limit).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct LikersResponse {
    pub user_ids: Vec<String>,
    pub users: Vec<UserProfile>,
}

/// GET /api/:entity_type/:entity_id/likers
pub async fn likers(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> Result<Json<LikersResponse>, ApiError> {
    let kind = parse_kind(&entity_type)?;
    let user_ids = likes::likers_of(&state.db, kind, &entity_id).await?;
    let profiles = users::get_profiles_by_uids(&state.db, &user_ids).await?;
    Ok(Json(LikersResponse {
        user_ids,
        users: profiles,
    }))
}

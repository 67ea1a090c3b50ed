//! Review endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use acapella_common::db::models::{EntityKind, Review, UserProfile};

use crate::db::{likes, reviews, users};
use crate::error::ApiError;
use crate::AppState;

fn parse_kind(raw: &str) -> Result<EntityKind, ApiError> {
    EntityKind::parse(raw).ok_or_else(|| ApiError::invalid(format!("Unknown entity type: {}", raw)))
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub entity_type: String,
    pub entity_id: String,
    pub rating: i64,
    #[serde(default)]
    pub review_text: String,
}

/// POST /api/reviews
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let kind = parse_kind(&req.entity_type)?;
    let review = reviews::create_review(
        &state.db,
        &user,
        kind,
        &req.entity_id,
        req.rating,
        &req.review_text,
    )
    .await?;

    info!(
        "Review {} by {} on {} {}",
        review.id, user.username, req.entity_type, req.entity_id
    );
    Ok(Json(review))
}

/// DELETE /api/reviews/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    reviews::delete_review(&state.db, &id, &user).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// Review plus the people who liked it, for the review detail page.
#[derive(Debug, Serialize)]
pub struct ReviewDetail {
    #[serde(flatten)]
    pub review: Review,
    pub likers: Vec<UserProfile>,
}

/// GET /api/reviews/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewDetail>, ApiError> {
    let review = reviews::get_review(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Review not found: {}", id)))?;

    let liker_ids = likes::likers_of(&state.db, EntityKind::Review, &id).await?;
    let likers = users::get_profiles_by_uids(&state.db, &liker_ids).await?;

    Ok(Json(ReviewDetail { review, likers }))
}

#[derive(Debug, Deserialize)]
pub struct EntityReviewsQuery {
    pub entity_type: String,
    pub entity_id: String,
    pub limit: Option<i64>,
}

/// GET /api/reviews?entity_type=...&entity_id=...
pub async fn list_for_entity(
    State(state): State<AppState>,
    Query(q): Query<EntityReviewsQuery>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let kind = parse_kind(&q.entity_type)?;
    let limit = crate::pagination::clamp_limit(q.limit);
    Ok(Json(
        reviews::reviews_for_entity(&state.db, kind, &q.entity_id, limit).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct UserReviewsQuery {
    pub limit: Option<i64>,
}

/// GET /api/users/:username/reviews
pub async fn list_by_user(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<UserReviewsQuery>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let user = users::get_by_username(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", name)))?;
    let limit = crate::pagination::clamp_limit(q.limit);
    Ok(Json(
        reviews::reviews_by_user(&state.db, &user.uid, limit).await?,
    ))
}

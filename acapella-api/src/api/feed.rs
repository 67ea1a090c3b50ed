//! Feed endpoints
//!
//! Both surfaces page with the same cursor scheme: `?cursor=` carries the
//! timestamp of the last item seen, each source is fetched with one row past
//! the page size, and `pagination::merge_into_page` assembles the page.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use acapella_common::db::models::UserProfile;

use crate::db::{feed, users};
use crate::error::ApiError;
use crate::pagination::{self, Cursor, FeedPage};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

fn parse_cursor(q: &FeedQuery) -> Result<Option<i64>, ApiError> {
    q.cursor
        .as_deref()
        .map(|raw| Cursor::parse(raw).map(|c| c.created_at))
        .transpose()
        .map_err(ApiError::from)
}

/// GET /api/users/:username/activity
///
/// Merged reviews, likes, and follows of one user, newest first.
pub async fn user_activity(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<FeedQuery>,
) -> Result<Json<FeedPage>, ApiError> {
    let user = users::get_by_username(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", name)))?;

    let before = parse_cursor(&q)?;
    let limit = pagination::clamp_limit(q.limit);
    let fetch = limit + 1;

    let sources = vec![
        feed::user_reviews(&state.db, &user.uid, before, fetch).await?,
        feed::user_likes(&state.db, &user.uid, before, fetch).await?,
        feed::user_follows(&state.db, &user.uid, before, fetch).await?,
    ];

    Ok(Json(pagination::merge_into_page(sources, limit)))
}

/// GET /api/feed/home
///
/// Written reviews from followed users over the last week.
pub async fn home(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Query(q): Query<FeedQuery>,
) -> Result<Json<FeedPage>, ApiError> {
    let before = parse_cursor(&q)?;
    let limit = pagination::clamp_limit(q.limit);
    let fetch = limit + 1;

    let sources = vec![feed::followed_reviews(&state.db, &user.uid, before, fetch).await?];
    Ok(Json(pagination::merge_into_page(sources, limit)))
}

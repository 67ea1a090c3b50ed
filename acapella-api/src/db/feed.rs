//! Activity feed queries
//!
//! Every feed surface (a user's activity page, the home feed) is assembled
//! from the same three source queries here, so review, like, and follow
//! entries render identically everywhere. Each source accepts an optional
//! "strictly older than" bound and a fetch count; callers pass `limit + 1`
//! and merge the sources with `pagination::merge_into_page`.

use acapella_common::db::models::{ActivityItem, ActivityType};
use acapella_common::time::{now_ms, DAY_MS};
use acapella_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Home feed only shows reviews from the last week.
pub const HOME_FEED_WINDOW_MS: i64 = 7 * DAY_MS;

fn review_item(row: &SqliteRow) -> Result<ActivityItem> {
    Ok(ActivityItem {
        activity_type: ActivityType::Review,
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        user_display_name: row.try_get("user_display_name")?,
        user_photo_url: row.try_get("user_photo_url")?,
        entity_type: row.try_get("entity_type")?,
        entity_id: row.try_get("entity_id")?,
        entity_title: row.try_get("entity_title")?,
        entity_cover_art_url: row.try_get("entity_cover_art_url")?,
        entity_username: None,
        rating: Some(row.try_get("rating")?),
        review_text: Some(row.try_get("review_text")?),
        created_at: row.try_get("created_at")?,
    })
}

fn like_item(row: &SqliteRow) -> Result<ActivityItem> {
    Ok(ActivityItem {
        activity_type: ActivityType::Like,
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        user_display_name: row.try_get("user_display_name")?,
        user_photo_url: row.try_get("user_photo_url")?,
        entity_type: row.try_get("entity_type")?,
        entity_id: row.try_get("entity_id")?,
        entity_title: row.try_get("entity_title")?,
        entity_cover_art_url: row.try_get("entity_cover_art_url")?,
        entity_username: None,
        rating: None,
        review_text: None,
        created_at: row.try_get("created_at")?,
    })
}

fn follow_item(row: &SqliteRow) -> Result<ActivityItem> {
    Ok(ActivityItem {
        activity_type: ActivityType::Follow,
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        user_display_name: row.try_get("user_display_name")?,
        user_photo_url: row.try_get("user_photo_url")?,
        entity_type: "user".to_string(),
        entity_id: row.try_get("entity_id")?,
        entity_title: row.try_get("entity_title")?,
        entity_cover_art_url: None,
        entity_username: row.try_get("entity_username")?,
        rating: None,
        review_text: None,
        created_at: row.try_get("created_at")?,
    })
}

/// Reviews written by one user, newest first.
pub async fn user_reviews(
    pool: &SqlitePool,
    uid: &str,
    before: Option<i64>,
    fetch: i64,
) -> Result<Vec<ActivityItem>> {
    let rows = sqlx::query(
        "SELECT * FROM reviews WHERE user_id = ? AND created_at < ? \
         ORDER BY created_at DESC LIMIT ?",
    )
    .bind(uid)
    .bind(before.unwrap_or(i64::MAX))
    .bind(fetch)
    .fetch_all(pool)
    .await?;
    rows.iter().map(review_item).collect()
}

/// Likes placed by one user, newest first. The liker's display fields come
/// from a join; like rows only denormalize the target.
pub async fn user_likes(
    pool: &SqlitePool,
    uid: &str,
    before: Option<i64>,
    fetch: i64,
) -> Result<Vec<ActivityItem>> {
    let rows = sqlx::query(
        "SELECT l.id, l.user_id, u.display_name AS user_display_name, \
         u.photo_url AS user_photo_url, l.entity_type, l.entity_id, l.entity_title, \
         l.entity_cover_art_url, l.created_at \
         FROM likes l JOIN users u ON u.uid = l.user_id \
         WHERE l.user_id = ? AND l.created_at < ? \
         ORDER BY l.created_at DESC LIMIT ?",
    )
    .bind(uid)
    .bind(before.unwrap_or(i64::MAX))
    .bind(fetch)
    .fetch_all(pool)
    .await?;
    rows.iter().map(like_item).collect()
}

/// Follow edges created by one user, newest first.
pub async fn user_follows(
    pool: &SqlitePool,
    uid: &str,
    before: Option<i64>,
    fetch: i64,
) -> Result<Vec<ActivityItem>> {
    let rows = sqlx::query(
        "SELECT f.follower_id || '_' || f.following_id AS id, f.follower_id AS user_id, \
         fu.display_name AS user_display_name, fu.photo_url AS user_photo_url, \
         f.following_id AS entity_id, tu.display_name AS entity_title, \
         tu.username AS entity_username, f.created_at \
         FROM follows f \
         JOIN users fu ON fu.uid = f.follower_id \
         JOIN users tu ON tu.uid = f.following_id \
         WHERE f.follower_id = ? AND f.created_at < ? \
         ORDER BY f.created_at DESC LIMIT ?",
    )
    .bind(uid)
    .bind(before.unwrap_or(i64::MAX))
    .bind(fetch)
    .fetch_all(pool)
    .await?;
    rows.iter().map(follow_item).collect()
}

/// Home feed source: written reviews from the users someone follows, newest
/// first, no older than a week, rating-only reviews excluded.
pub async fn followed_reviews(
    pool: &SqlitePool,
    uid: &str,
    before: Option<i64>,
    fetch: i64,
) -> Result<Vec<ActivityItem>> {
    let cutoff = now_ms() - HOME_FEED_WINDOW_MS;
    let rows = sqlx::query(
        "SELECT r.* FROM reviews r \
         JOIN follows f ON f.following_id = r.user_id \
         WHERE f.follower_id = ? AND r.created_at >= ? AND r.created_at < ? \
         AND length(trim(r.review_text)) > 0 \
         ORDER BY r.created_at DESC LIMIT ?",
    )
    .bind(uid)
    .bind(cutoff)
    .bind(before.unwrap_or(i64::MAX))
    .bind(fetch)
    .fetch_all(pool)
    .await?;
    rows.iter().map(review_item).collect()
}

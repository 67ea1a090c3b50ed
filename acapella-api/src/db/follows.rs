//! Follow graph storage
//!
//! One row per directed edge. The edge insert/delete and both profiles'
//! denormalized counters commit in a single transaction, so the counters can
//! never drift from the true row counts.

use acapella_common::db::models::UserProfile;
use acapella_common::time::now_ms;
use acapella_common::{Error, Result};
use sqlx::SqlitePool;

use crate::db::users;

/// Create the follow edge. Returns false when the edge already existed
/// (idempotent; counters untouched).
pub async fn follow(pool: &SqlitePool, follower_id: &str, following_id: &str) -> Result<bool> {
    if follower_id == following_id {
        return Err(Error::InvalidInput("You cannot follow yourself.".to_string()));
    }

    let target: Option<(String,)> = sqlx::query_as("SELECT uid FROM users WHERE uid = ?")
        .bind(following_id)
        .fetch_optional(pool)
        .await?;
    if target.is_none() {
        return Err(Error::NotFound(format!("User not found: {following_id}")));
    }

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO follows (follower_id, following_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(follower_id)
    .bind(following_id)
    .bind(now_ms())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if inserted == 1 {
        sqlx::query("UPDATE users SET following_count = following_count + 1 WHERE uid = ?")
            .bind(follower_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET followers_count = followers_count + 1 WHERE uid = ?")
            .bind(following_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(inserted == 1)
}

/// Remove the follow edge. Returns false when no edge existed.
pub async fn unfollow(pool: &SqlitePool, follower_id: &str, following_id: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
        .bind(follower_id)
        .bind(following_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 1 {
        sqlx::query("UPDATE users SET following_count = following_count - 1 WHERE uid = ?")
            .bind(follower_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET followers_count = followers_count - 1 WHERE uid = ?")
            .bind(following_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(deleted == 1)
}

/// Does the directed edge exist?
pub async fn is_following(pool: &SqlitePool, follower_id: &str, following_id: &str) -> Result<bool> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower_id)
            .bind(following_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

/// Uids the given user follows.
pub async fn following_ids(pool: &SqlitePool, uid: &str) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT following_id FROM follows WHERE follower_id = ? ORDER BY created_at DESC",
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Profiles following the given user.
pub async fn followers_of(pool: &SqlitePool, uid: &str) -> Result<Vec<UserProfile>> {
    let ids: Vec<(String,)> = sqlx::query_as(
        "SELECT follower_id FROM follows WHERE following_id = ? ORDER BY created_at DESC",
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;
    users::get_profiles_by_uids(pool, &ids.into_iter().map(|(id,)| id).collect::<Vec<_>>()).await
}

/// Profiles the given user follows.
pub async fn following_of(pool: &SqlitePool, uid: &str) -> Result<Vec<UserProfile>> {
    let ids = following_ids(pool, uid).await?;
    users::get_profiles_by_uids(pool, &ids).await
}

/// True edge counts, for reconciliation checks against the denormalized
/// profile counters.
pub async fn edge_counts(pool: &SqlitePool, uid: &str) -> Result<(i64, i64)> {
    let (followers,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM follows WHERE following_id = ?")
            .bind(uid)
            .fetch_one(pool)
            .await?;
    let (following,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(uid)
            .fetch_one(pool)
            .await?;
    Ok((followers, following))
}

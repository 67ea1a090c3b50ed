//! Review storage
//!
//! One review per (user, entity), enforced by a UNIQUE constraint rather
//! than a read-then-write probe. Creating a review bumps the target's
//! `review_count` in the same transaction; deleting one removes the likes
//! that pointed at it and rolls the counter back, also transactionally.

use acapella_common::db::models::{EntityKind, Review, UserProfile};
use acapella_common::time::now_ms;
use acapella_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Minimum length of the written portion of a review.
pub const MIN_REVIEW_TEXT_LEN: usize = 10;

fn review_from_row(row: &SqliteRow) -> Result<Review> {
    let entity_type: String = row.try_get("entity_type")?;
    Ok(Review {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        user_display_name: row.try_get("user_display_name")?,
        user_photo_url: row.try_get("user_photo_url")?,
        rating: row.try_get("rating")?,
        review_text: row.try_get("review_text")?,
        likes_count: row.try_get("likes_count")?,
        entity_type: EntityKind::parse(&entity_type)
            .ok_or_else(|| Error::Internal(format!("Unknown entity type: {}", entity_type)))?,
        entity_id: row.try_get("entity_id")?,
        entity_title: row.try_get("entity_title")?,
        entity_cover_art_url: row.try_get("entity_cover_art_url")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Rating must be chosen (1-5) and the text, once trimmed, must carry some
/// substance. A zero rating means the picker was never touched.
pub fn validate(rating: i64, review_text: &str) -> Result<()> {
    if rating == 0 {
        return Err(Error::InvalidInput("Please select a rating.".to_string()));
    }
    if !(1..=5).contains(&rating) {
        return Err(Error::InvalidInput(
            "Rating must be between 1 and 5.".to_string(),
        ));
    }
    if review_text.trim().len() < MIN_REVIEW_TEXT_LEN {
        return Err(Error::InvalidInput(format!(
            "Review must be at least {} characters.",
            MIN_REVIEW_TEXT_LEN
        )));
    }
    Ok(())
}

fn is_duplicate_review(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.message().contains("reviews.")
        }
        _ => false,
    }
}

/// Create a review and bump the target's review count, in one transaction.
pub async fn create_review(
    pool: &SqlitePool,
    author: &UserProfile,
    kind: EntityKind,
    entity_id: &str,
    rating: i64,
    review_text: &str,
) -> Result<Review> {
    if !kind.reviewable() {
        return Err(Error::InvalidInput(format!(
            "Cannot review a {}.",
            kind.as_str()
        )));
    }
    validate(rating, review_text)?;

    // Snapshot the target's display fields; also proves it exists.
    let target: Option<(String, Option<String>)> = sqlx::query_as(&format!(
        "SELECT title, cover_art_url FROM {} WHERE id = ?",
        match kind {
            EntityKind::Song => "songs",
            EntityKind::Album => "albums",
            EntityKind::Review => unreachable!(),
        }
    ))
    .bind(entity_id)
    .fetch_optional(pool)
    .await?;
    let (entity_title, entity_cover) = target
        .ok_or_else(|| Error::NotFound(format!("{} not found: {}", kind.as_str(), entity_id)))?;

    let id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    let insert = sqlx::query(
        "INSERT INTO reviews (id, user_id, user_display_name, user_photo_url, rating, \
         review_text, entity_type, entity_id, entity_title, entity_cover_art_url, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&author.uid)
    .bind(&author.display_name)
    .bind(&author.photo_url)
    .bind(rating)
    .bind(review_text.trim())
    .bind(kind.as_str())
    .bind(entity_id)
    .bind(&entity_title)
    .bind(&entity_cover)
    .bind(now_ms())
    .execute(&mut *tx)
    .await;

    if let Err(err) = insert {
        if is_duplicate_review(&err) {
            return Err(Error::Conflict(
                "You have already reviewed this.".to_string(),
            ));
        }
        return Err(err.into());
    }

    let sql = format!(
        "UPDATE {} SET review_count = review_count + 1 WHERE id = ?",
        match kind {
            EntityKind::Song => "songs",
            EntityKind::Album => "albums",
            EntityKind::Review => unreachable!(),
        }
    );
    sqlx::query(&sql).bind(entity_id).execute(&mut *tx).await?;

    tx.commit().await?;

    get_review(pool, &id)
        .await?
        .ok_or_else(|| Error::Internal("Review vanished after creation".to_string()))
}

/// Delete a review: the row, every like pointing at it, and the target's
/// review count all change in one transaction. Only the author or an admin
/// may delete.
pub async fn delete_review(
    pool: &SqlitePool,
    review_id: &str,
    requester: &UserProfile,
) -> Result<()> {
    let review = get_review(pool, review_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Review not found: {}", review_id)))?;

    if review.user_id != requester.uid && !requester.role.can_manage_catalog() {
        return Err(Error::Forbidden(
            "You can only delete your own reviews.".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM likes WHERE entity_type = 'review' AND entity_id = ?")
        .bind(review_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(review_id)
        .execute(&mut *tx)
        .await?;

    let sql = format!(
        "UPDATE {} SET review_count = review_count - 1 WHERE id = ?",
        match review.entity_type {
            EntityKind::Song => "songs",
            EntityKind::Album => "albums",
            EntityKind::Review => unreachable!(),
        }
    );
    sqlx::query(&sql)
        .bind(&review.entity_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn get_review(pool: &SqlitePool, id: &str) -> Result<Option<Review>> {
    let row = sqlx::query("SELECT * FROM reviews WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(review_from_row).transpose()
}

/// Reviews of one entity, newest first.
pub async fn reviews_for_entity(
    pool: &SqlitePool,
    kind: EntityKind,
    entity_id: &str,
    limit: i64,
) -> Result<Vec<Review>> {
    let rows = sqlx::query(
        "SELECT * FROM reviews WHERE entity_type = ? AND entity_id = ? \
         ORDER BY created_at DESC LIMIT ?",
    )
    .bind(kind.as_str())
    .bind(entity_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.iter().map(review_from_row).collect()
}

/// A user's reviews, newest first.
pub async fn reviews_by_user(pool: &SqlitePool, uid: &str, limit: i64) -> Result<Vec<Review>> {
    let rows =
        sqlx::query("SELECT * FROM reviews WHERE user_id = ? ORDER BY created_at DESC LIMIT ?")
            .bind(uid)
            .bind(limit)
            .fetch_all(pool)
            .await?;
    rows.iter().map(review_from_row).collect()
}

/// The user's existing review of an entity, if any.
pub async fn review_by_user_for_entity(
    pool: &SqlitePool,
    uid: &str,
    kind: EntityKind,
    entity_id: &str,
) -> Result<Option<Review>> {
    let row = sqlx::query(
        "SELECT * FROM reviews WHERE user_id = ? AND entity_type = ? AND entity_id = ?",
    )
    .bind(uid)
    .bind(kind.as_str())
    .bind(entity_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(review_from_row).transpose()
}

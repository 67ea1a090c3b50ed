//! Like storage
//!
//! Like ids are deterministic (`{user_id}_{kind}_{entity_id}`) and the table
//! carries a UNIQUE constraint on (user, kind, entity), so duplicate likes
//! cannot exist no matter how requests interleave. The kind sits in the id
//! so likes of same-id entities of different kinds stay distinct rows. The
//! like row and the target's `likes_count` commit in one transaction.

use acapella_common::db::models::{EntityKind, Like};
use acapella_common::time::now_ms;
use acapella_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn like_id(user_id: &str, kind: EntityKind, entity_id: &str) -> String {
    format!("{}_{}_{}", user_id, kind.as_str(), entity_id)
}

fn counter_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Song => "songs",
        EntityKind::Album => "albums",
        EntityKind::Review => "reviews",
    }
}

fn like_from_row(row: &SqliteRow) -> Result<Like> {
    let entity_type: String = row.try_get("entity_type")?;
    let review_on: Option<String> = row.try_get("review_on_entity_type")?;
    Ok(Like {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        entity_type: EntityKind::parse(&entity_type)
            .ok_or_else(|| Error::Internal(format!("Unknown entity type: {}", entity_type)))?,
        entity_id: row.try_get("entity_id")?,
        entity_title: row.try_get("entity_title")?,
        entity_cover_art_url: row.try_get("entity_cover_art_url")?,
        review_on_entity_type: review_on.as_deref().and_then(EntityKind::parse),
        review_on_entity_id: row.try_get("review_on_entity_id")?,
        review_on_entity_title: row.try_get("review_on_entity_title")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Denormalized display fields captured onto the like row at creation.
struct TargetSnapshot {
    title: Option<String>,
    cover_art_url: Option<String>,
    review_on_entity_type: Option<String>,
    review_on_entity_id: Option<String>,
    review_on_entity_title: Option<String>,
}

async fn snapshot_target(
    pool: &SqlitePool,
    kind: EntityKind,
    entity_id: &str,
) -> Result<TargetSnapshot> {
    let missing = || Error::NotFound(format!("{} not found: {}", kind.as_str(), entity_id));

    match kind {
        EntityKind::Song => {
            let row: Option<(String, Option<String>)> =
                sqlx::query_as("SELECT title, cover_art_url FROM songs WHERE id = ?")
                    .bind(entity_id)
                    .fetch_optional(pool)
                    .await?;
            let (title, cover) = row.ok_or_else(missing)?;
            Ok(TargetSnapshot {
                title: Some(title),
                cover_art_url: cover,
                review_on_entity_type: None,
                review_on_entity_id: None,
                review_on_entity_title: None,
            })
        }
        EntityKind::Album => {
            let row: Option<(String, Option<String>)> =
                sqlx::query_as("SELECT title, cover_art_url FROM albums WHERE id = ?")
                    .bind(entity_id)
                    .fetch_optional(pool)
                    .await?;
            let (title, cover) = row.ok_or_else(missing)?;
            Ok(TargetSnapshot {
                title: Some(title),
                cover_art_url: cover,
                review_on_entity_type: None,
                review_on_entity_id: None,
                review_on_entity_title: None,
            })
        }
        EntityKind::Review => {
            // A liked review points back at the thing it reviewed, so the
            // activity surface can render "liked a review of X".
            let row: Option<(Option<String>, Option<String>, String, String)> = sqlx::query_as(
                "SELECT entity_title, entity_cover_art_url, entity_type, entity_id \
                 FROM reviews WHERE id = ?",
            )
            .bind(entity_id)
            .fetch_optional(pool)
            .await?;
            let (title, cover, on_type, on_id) = row.ok_or_else(missing)?;
            Ok(TargetSnapshot {
                title: title.clone(),
                cover_art_url: cover,
                review_on_entity_type: Some(on_type),
                review_on_entity_id: Some(on_id),
                review_on_entity_title: title,
            })
        }
    }
}

/// Like an entity. Returns false when the like already existed (idempotent;
/// counter untouched). The target must exist.
pub async fn like(
    pool: &SqlitePool,
    user_id: &str,
    kind: EntityKind,
    entity_id: &str,
) -> Result<bool> {
    let snapshot = snapshot_target(pool, kind, entity_id).await?;

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO likes (id, user_id, entity_type, entity_id, entity_title, \
         entity_cover_art_url, review_on_entity_type, review_on_entity_id, \
         review_on_entity_title, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(like_id(user_id, kind, entity_id))
    .bind(user_id)
    .bind(kind.as_str())
    .bind(entity_id)
    .bind(&snapshot.title)
    .bind(&snapshot.cover_art_url)
    .bind(&snapshot.review_on_entity_type)
    .bind(&snapshot.review_on_entity_id)
    .bind(&snapshot.review_on_entity_title)
    .bind(now_ms())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if inserted == 1 {
        let sql = format!(
            "UPDATE {} SET likes_count = likes_count + 1 WHERE id = ?",
            counter_table(kind)
        );
        sqlx::query(&sql).bind(entity_id).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(inserted == 1)
}

/// Remove a like. Returns false when no like existed.
pub async fn unlike(
    pool: &SqlitePool,
    user_id: &str,
    kind: EntityKind,
    entity_id: &str,
) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM likes WHERE id = ?")
        .bind(like_id(user_id, kind, entity_id))
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 1 {
        let sql = format!(
            "UPDATE {} SET likes_count = likes_count - 1 WHERE id = ?",
            counter_table(kind)
        );
        sqlx::query(&sql).bind(entity_id).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(deleted == 1)
}

/// Does the user hold a like on this entity?
pub async fn is_liked(
    pool: &SqlitePool,
    user_id: &str,
    kind: EntityKind,
    entity_id: &str,
) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM likes WHERE id = ?")
        .bind(like_id(user_id, kind, entity_id))
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// A user's likes, newest first, optionally restricted to one entity kind.
pub async fn likes_of_user(
    pool: &SqlitePool,
    user_id: &str,
    kind: Option<EntityKind>,
    limit: i64,
) -> Result<Vec<Like>> {
    let rows = match kind {
        Some(kind) => {
            sqlx::query(
                "SELECT * FROM likes WHERE user_id = ? AND entity_type = ? \
                 ORDER BY created_at DESC LIMIT ?",
            )
            .bind(user_id)
            .bind(kind.as_str())
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query("SELECT * FROM likes WHERE user_id = ? ORDER BY created_at DESC LIMIT ?")
                .bind(user_id)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };
    rows.iter().map(like_from_row).collect()
}

/// Uids of everyone who liked the given entity, newest first.
pub async fn likers_of(
    pool: &SqlitePool,
    kind: EntityKind,
    entity_id: &str,
) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT user_id FROM likes WHERE entity_type = ? AND entity_id = ? \
         ORDER BY created_at DESC",
    )
    .bind(kind.as_str())
    .bind(entity_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(uid,)| uid).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::{self, SongInput};
    use crate::db::users::create_user;
    use acapella_common::db::init_memory_database;

    async fn seeded(pool: &SqlitePool) -> (String, String) {
        let user = create_user(pool, "fan@example.com", "password1", None, &[])
            .await
            .unwrap();
        let song = catalog::create_song(
            pool,
            &SongInput {
                title: "Anthem".to_string(),
                artist_ids: Vec::new(),
                album_id: None,
                duration_secs: 180,
                release_date: None,
                genre: None,
                credits: None,
                cover_art_url: Some("https://img.example/a.jpg".to_string()),
                platform_links: None,
            },
        )
        .await
        .unwrap();
        (user.uid, song.id)
    }

    #[tokio::test]
    async fn test_like_round_trip_with_counter() {
        let pool = init_memory_database().await.unwrap();
        let (uid, song_id) = seeded(&pool).await;

        assert!(like(&pool, &uid, EntityKind::Song, &song_id).await.unwrap());
        assert!(is_liked(&pool, &uid, EntityKind::Song, &song_id).await.unwrap());

        // Second like is a no-op; the counter stays at one
        assert!(!like(&pool, &uid, EntityKind::Song, &song_id).await.unwrap());
        let song = catalog::get_song(&pool, &song_id).await.unwrap().unwrap();
        assert_eq!(song.likes_count, 1);

        assert!(unlike(&pool, &uid, EntityKind::Song, &song_id).await.unwrap());
        assert!(!unlike(&pool, &uid, EntityKind::Song, &song_id).await.unwrap());
        let song = catalog::get_song(&pool, &song_id).await.unwrap().unwrap();
        assert_eq!(song.likes_count, 0);
        assert!(!is_liked(&pool, &uid, EntityKind::Song, &song_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_like_missing_target_rejected() {
        let pool = init_memory_database().await.unwrap();
        let (uid, _) = seeded(&pool).await;
        let err = like(&pool, &uid, EntityKind::Album, "nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_like_snapshot_carries_title() {
        let pool = init_memory_database().await.unwrap();
        let (uid, song_id) = seeded(&pool).await;
        like(&pool, &uid, EntityKind::Song, &song_id).await.unwrap();

        let likes = likes_of_user(&pool, &uid, None, 10).await.unwrap();
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].id, format!("{}_song_{}", uid, song_id));
        assert_eq!(likes[0].entity_title.as_deref(), Some("Anthem"));
        assert_eq!(
            likes[0].entity_cover_art_url.as_deref(),
            Some("https://img.example/a.jpg")
        );
    }

    #[tokio::test]
    async fn test_like_distinguishes_entity_kinds() {
        let pool = init_memory_database().await.unwrap();
        let (uid, _) = seeded(&pool).await;

        // The same id held by two kinds of entity must yield two distinct
        // like rows, not one swallowing the other
        sqlx::query("INSERT INTO songs (id, title, title_lowercase) VALUES ('shared', 'Twin', 'twin')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO albums (id, title, title_lowercase) VALUES ('shared', 'Twin', 'twin')")
            .execute(&pool)
            .await
            .unwrap();

        assert!(like(&pool, &uid, EntityKind::Song, "shared").await.unwrap());
        assert!(like(&pool, &uid, EntityKind::Album, "shared").await.unwrap());

        let likes = likes_of_user(&pool, &uid, None, 10).await.unwrap();
        assert_eq!(likes.len(), 2);

        // Unliking one kind leaves the other untouched
        assert!(unlike(&pool, &uid, EntityKind::Song, "shared").await.unwrap());
        assert!(!is_liked(&pool, &uid, EntityKind::Song, "shared").await.unwrap());
        assert!(is_liked(&pool, &uid, EntityKind::Album, "shared").await.unwrap());
    }

    #[tokio::test]
    async fn test_likers_of_lists_users() {
        let pool = init_memory_database().await.unwrap();
        let (uid, song_id) = seeded(&pool).await;
        let other = create_user(&pool, "other@example.com", "password1", None, &[])
            .await
            .unwrap();

        like(&pool, &uid, EntityKind::Song, &song_id).await.unwrap();
        like(&pool, &other.uid, EntityKind::Song, &song_id).await.unwrap();

        let likers = likers_of(&pool, EntityKind::Song, &song_id).await.unwrap();
        assert_eq!(likers.len(), 2);
        assert!(likers.contains(&uid));
        assert!(likers.contains(&other.uid));
    }
}

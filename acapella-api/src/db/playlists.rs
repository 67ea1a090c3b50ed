//! Playlist storage

use acapella_common::db::models::Playlist;
use acapella_common::time::now_ms;
use acapella_common::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistInput {
    pub title: String,
    #[serde(default)]
    pub song_ids: Vec<String>,
    pub platform_links: Option<Value>,
}

fn playlist_from_row(row: &SqliteRow) -> Result<Playlist> {
    let links: Option<String> = row.try_get("platform_links")?;
    Ok(Playlist {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        song_ids: Vec::new(),
        platform_links: links.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.try_get("created_at")?,
    })
}

pub async fn create_playlist(
    pool: &SqlitePool,
    user_id: &str,
    input: &PlaylistInput,
) -> Result<Playlist> {
    if input.title.trim().is_empty() {
        return Err(Error::InvalidInput("Playlist title is required.".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO playlists (id, user_id, title, platform_links, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(input.title.trim())
    .bind(input.platform_links.as_ref().map(|v| v.to_string()))
    .bind(now_ms())
    .execute(&mut *tx)
    .await?;

    replace_songs(&mut tx, &id, &input.song_ids).await?;
    tx.commit().await?;

    get_playlist(pool, &id)
        .await?
        .ok_or_else(|| Error::Internal("Playlist vanished after creation".to_string()))
}

/// Update title, songs, and links. Owner only.
pub async fn update_playlist(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    input: &PlaylistInput,
) -> Result<Playlist> {
    let existing = get_playlist(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Playlist not found: {}", id)))?;
    if existing.user_id != user_id {
        return Err(Error::Forbidden(
            "You can only edit your own playlists.".to_string(),
        ));
    }
    if input.title.trim().is_empty() {
        return Err(Error::InvalidInput("Playlist title is required.".to_string()));
    }

    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE playlists SET title = ?, platform_links = ? WHERE id = ?")
        .bind(input.title.trim())
        .bind(input.platform_links.as_ref().map(|v| v.to_string()))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    replace_songs(&mut tx, id, &input.song_ids).await?;
    tx.commit().await?;

    get_playlist(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Playlist not found: {}", id)))
}

/// Owner only.
pub async fn delete_playlist(pool: &SqlitePool, id: &str, user_id: &str) -> Result<()> {
    let existing = get_playlist(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Playlist not found: {}", id)))?;
    if existing.user_id != user_id {
        return Err(Error::Forbidden(
            "You can only delete your own playlists.".to_string(),
        ));
    }

    sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_playlist(pool: &SqlitePool, id: &str) -> Result<Option<Playlist>> {
    let row = sqlx::query("SELECT * FROM playlists WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let mut playlist = playlist_from_row(&row)?;
            playlist.song_ids = song_ids(pool, id).await?;
            Ok(Some(playlist))
        }
        None => Ok(None),
    }
}

pub async fn playlists_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Playlist>> {
    let rows =
        sqlx::query("SELECT * FROM playlists WHERE user_id = ? ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    let mut playlists = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut playlist = playlist_from_row(row)?;
        playlist.song_ids = song_ids(pool, &playlist.id).await?;
        playlists.push(playlist);
    }
    Ok(playlists)
}

async fn song_ids(pool: &SqlitePool, playlist_id: &str) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT song_id FROM playlist_songs WHERE playlist_id = ? ORDER BY position",
    )
    .bind(playlist_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

async fn replace_songs(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    playlist_id: &str,
    song_ids: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = ?")
        .bind(playlist_id)
        .execute(&mut **tx)
        .await?;
    for (position, song_id) in song_ids.iter().enumerate() {
        sqlx::query("INSERT INTO playlist_songs (playlist_id, position, song_id) VALUES (?, ?, ?)")
            .bind(playlist_id)
            .bind(position as i64)
            .bind(song_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

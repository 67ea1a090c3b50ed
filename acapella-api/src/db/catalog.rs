//! Catalog storage: songs, albums, artists
//!
//! The ID-array relations of the source system (`artistIds`, `tracklist`)
//! are stored as join-table rows and reassembled onto the models on read.
//! `title_lowercase`/`name_lowercase` are maintained here on every write and
//! back the prefix search.

use acapella_common::db::models::{Album, Artist, Song};
use acapella_common::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool, Transaction};
use uuid::Uuid;

type Tx<'a> = Transaction<'a, sqlx::Sqlite>;

// ============================================================================
// Input types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SongInput {
    pub title: String,
    #[serde(default)]
    pub artist_ids: Vec<String>,
    pub album_id: Option<String>,
    #[serde(default)]
    pub duration_secs: i64,
    pub release_date: Option<String>,
    pub genre: Option<String>,
    pub credits: Option<Value>,
    pub cover_art_url: Option<String>,
    pub platform_links: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumInput {
    pub title: String,
    #[serde(default)]
    pub artist_ids: Vec<String>,
    pub release_date: Option<String>,
    pub cover_art_url: Option<String>,
    pub genre: Option<String>,
    pub associated_film: Option<String>,
    pub platform_links: Option<Value>,
    #[serde(default)]
    pub tracklist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistInput {
    pub name: String,
    pub image_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub socials: Option<Value>,
    pub platform_links: Option<Value>,
}

// ============================================================================
// Row mapping
// ============================================================================

fn json_col(row: &SqliteRow, name: &str) -> Result<Option<Value>> {
    let raw: Option<String> = row.try_get(name)?;
    Ok(raw.and_then(|s| serde_json::from_str(&s).ok()))
}

fn song_from_row(row: &SqliteRow) -> Result<Song> {
    Ok(Song {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        title_lowercase: row.try_get("title_lowercase")?,
        artist_ids: Vec::new(),
        album_id: row.try_get("album_id")?,
        duration_secs: row.try_get("duration_secs")?,
        release_date: row.try_get("release_date")?,
        genre: row.try_get("genre")?,
        credits: json_col(row, "credits")?,
        cover_art_url: row.try_get("cover_art_url")?,
        platform_links: json_col(row, "platform_links")?,
        review_count: row.try_get("review_count")?,
        likes_count: row.try_get("likes_count")?,
    })
}

fn album_from_row(row: &SqliteRow) -> Result<Album> {
    Ok(Album {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        title_lowercase: row.try_get("title_lowercase")?,
        artist_ids: Vec::new(),
        release_date: row.try_get("release_date")?,
        cover_art_url: row.try_get("cover_art_url")?,
        genre: row.try_get("genre")?,
        associated_film: row.try_get("associated_film")?,
        platform_links: json_col(row, "platform_links")?,
        tracklist: Vec::new(),
        review_count: row.try_get("review_count")?,
        likes_count: row.try_get("likes_count")?,
    })
}

fn artist_from_row(row: &SqliteRow) -> Result<Artist> {
    let genres_raw: Option<String> = row.try_get("genres")?;
    Ok(Artist {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        name_lowercase: row.try_get("name_lowercase")?,
        image_url: row.try_get("image_url")?,
        cover_image_url: row.try_get("cover_image_url")?,
        bio: row.try_get("bio")?,
        genres: genres_raw
            .and_then(|s| serde_json::from_str::<Vec<String>>(&s).ok())
            .unwrap_or_default(),
        socials: json_col(row, "socials")?,
        platform_links: json_col(row, "platform_links")?,
    })
}

// ============================================================================
// Songs
// ============================================================================

pub async fn create_song(pool: &SqlitePool, input: &SongInput) -> Result<Song> {
    let id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO songs (id, title, title_lowercase, album_id, duration_secs, release_date, \
         genre, credits, cover_art_url, platform_links) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&input.title)
    .bind(input.title.to_lowercase())
    .bind(&input.album_id)
    .bind(input.duration_secs)
    .bind(&input.release_date)
    .bind(&input.genre)
    .bind(input.credits.as_ref().map(|v| v.to_string()))
    .bind(&input.cover_art_url)
    .bind(input.platform_links.as_ref().map(|v| v.to_string()))
    .execute(&mut *tx)
    .await?;

    replace_song_artists(&mut tx, &id, &input.artist_ids).await?;
    tx.commit().await?;

    get_song(pool, &id)
        .await?
        .ok_or_else(|| Error::Internal("Song vanished after creation".to_string()))
}

pub async fn update_song(pool: &SqlitePool, id: &str, input: &SongInput) -> Result<Song> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE songs SET title = ?, title_lowercase = ?, album_id = ?, duration_secs = ?, \
         release_date = ?, genre = ?, credits = ?, cover_art_url = ?, platform_links = ? \
         WHERE id = ?",
    )
    .bind(&input.title)
    .bind(input.title.to_lowercase())
    .bind(&input.album_id)
    .bind(input.duration_secs)
    .bind(&input.release_date)
    .bind(&input.genre)
    .bind(input.credits.as_ref().map(|v| v.to_string()))
    .bind(&input.cover_art_url)
    .bind(input.platform_links.as_ref().map(|v| v.to_string()))
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(Error::NotFound(format!("Song not found: {}", id)));
    }

    replace_song_artists(&mut tx, id, &input.artist_ids).await?;
    tx.commit().await?;

    get_song(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Song not found: {}", id)))
}

pub async fn delete_song(pool: &SqlitePool, id: &str) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::NotFound(format!("Song not found: {}", id)));
    }
    Ok(())
}

pub async fn get_song(pool: &SqlitePool, id: &str) -> Result<Option<Song>> {
    let row = sqlx::query("SELECT * FROM songs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let mut song = song_from_row(&row)?;
            song.artist_ids = linked_ids(
                pool,
                "SELECT artist_id FROM song_artists WHERE song_id = ? ORDER BY position",
                id,
            )
            .await?;
            Ok(Some(song))
        }
        None => Ok(None),
    }
}

/// Songs ordered by review count descending (the "trending" surface).
pub async fn trending_songs(pool: &SqlitePool, limit: i64) -> Result<Vec<Song>> {
    let rows = sqlx::query("SELECT * FROM songs ORDER BY review_count DESC, title_lowercase LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?;
    collect_songs(pool, rows).await
}

pub async fn list_songs(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Song>> {
    let rows = sqlx::query("SELECT * FROM songs ORDER BY title_lowercase LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    collect_songs(pool, rows).await
}

/// Escape LIKE metacharacters so a search term matches literally. The
/// queries pair this with `ESCAPE '\'`.
fn like_prefix(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Prefix search on the lowercase title.
pub async fn search_songs(pool: &SqlitePool, prefix: &str, limit: i64) -> Result<Vec<Song>> {
    let rows = sqlx::query(
        "SELECT * FROM songs WHERE title_lowercase LIKE ? || '%' ESCAPE '\\' \
         ORDER BY title_lowercase LIMIT ?",
    )
    .bind(like_prefix(&prefix.to_lowercase()))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    collect_songs(pool, rows).await
}

async fn collect_songs(pool: &SqlitePool, rows: Vec<SqliteRow>) -> Result<Vec<Song>> {
    let mut songs = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut song = song_from_row(row)?;
        song.artist_ids = linked_ids(
            pool,
            "SELECT artist_id FROM song_artists WHERE song_id = ? ORDER BY position",
            &song.id,
        )
        .await?;
        songs.push(song);
    }
    Ok(songs)
}

async fn replace_song_artists(tx: &mut Tx<'_>, song_id: &str, artist_ids: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM song_artists WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut **tx)
        .await?;
    for (position, artist_id) in artist_ids.iter().enumerate() {
        sqlx::query("INSERT INTO song_artists (song_id, artist_id, position) VALUES (?, ?, ?)")
            .bind(song_id)
            .bind(artist_id)
            .bind(position as i64)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

// ============================================================================
// Albums
// ============================================================================

pub async fn create_album(pool: &SqlitePool, input: &AlbumInput) -> Result<Album> {
    let id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO albums (id, title, title_lowercase, release_date, cover_art_url, genre, \
         associated_film, platform_links) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&input.title)
    .bind(input.title.to_lowercase())
    .bind(&input.release_date)
    .bind(&input.cover_art_url)
    .bind(&input.genre)
    .bind(&input.associated_film)
    .bind(input.platform_links.as_ref().map(|v| v.to_string()))
    .execute(&mut *tx)
    .await?;

    replace_album_relations(&mut tx, &id, &input.artist_ids, &input.tracklist).await?;
    tx.commit().await?;

    get_album(pool, &id)
        .await?
        .ok_or_else(|| Error::Internal("Album vanished after creation".to_string()))
}

pub async fn update_album(pool: &SqlitePool, id: &str, input: &AlbumInput) -> Result<Album> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE albums SET title = ?, title_lowercase = ?, release_date = ?, cover_art_url = ?, \
         genre = ?, associated_film = ?, platform_links = ? WHERE id = ?",
    )
    .bind(&input.title)
    .bind(input.title.to_lowercase())
    .bind(&input.release_date)
    .bind(&input.cover_art_url)
    .bind(&input.genre)
    .bind(&input.associated_film)
    .bind(input.platform_links.as_ref().map(|v| v.to_string()))
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(Error::NotFound(format!("Album not found: {}", id)));
    }

    replace_album_relations(&mut tx, id, &input.artist_ids, &input.tracklist).await?;
    tx.commit().await?;

    get_album(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Album not found: {}", id)))
}

pub async fn delete_album(pool: &SqlitePool, id: &str) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM albums WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::NotFound(format!("Album not found: {}", id)));
    }
    Ok(())
}

pub async fn get_album(pool: &SqlitePool, id: &str) -> Result<Option<Album>> {
    let row = sqlx::query("SELECT * FROM albums WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let mut album = album_from_row(&row)?;
            album.artist_ids = linked_ids(
                pool,
                "SELECT artist_id FROM album_artists WHERE album_id = ? ORDER BY position",
                id,
            )
            .await?;
            album.tracklist = linked_ids(
                pool,
                "SELECT song_id FROM album_tracks WHERE album_id = ? ORDER BY position",
                id,
            )
            .await?;
            Ok(Some(album))
        }
        None => Ok(None),
    }
}

/// Albums ordered by release date descending (the "new releases" surface).
pub async fn new_releases(pool: &SqlitePool, limit: i64) -> Result<Vec<Album>> {
    let rows = sqlx::query("SELECT * FROM albums ORDER BY release_date DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?;
    collect_albums(pool, rows).await
}

/// Albums ordered by review count descending (the "featured" surface).
pub async fn featured_albums(pool: &SqlitePool, limit: i64) -> Result<Vec<Album>> {
    let rows = sqlx::query("SELECT * FROM albums ORDER BY review_count DESC, title_lowercase LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?;
    collect_albums(pool, rows).await
}

pub async fn list_albums(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Album>> {
    let rows = sqlx::query("SELECT * FROM albums ORDER BY title_lowercase LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    collect_albums(pool, rows).await
}

pub async fn search_albums(pool: &SqlitePool, prefix: &str, limit: i64) -> Result<Vec<Album>> {
    let rows = sqlx::query(
        "SELECT * FROM albums WHERE title_lowercase LIKE ? || '%' ESCAPE '\\' \
         ORDER BY title_lowercase LIMIT ?",
    )
    .bind(like_prefix(&prefix.to_lowercase()))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    collect_albums(pool, rows).await
}

async fn collect_albums(pool: &SqlitePool, rows: Vec<SqliteRow>) -> Result<Vec<Album>> {
    let mut albums = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut album = album_from_row(row)?;
        album.artist_ids = linked_ids(
            pool,
            "SELECT artist_id FROM album_artists WHERE album_id = ? ORDER BY position",
            &album.id,
        )
        .await?;
        album.tracklist = linked_ids(
            pool,
            "SELECT song_id FROM album_tracks WHERE album_id = ? ORDER BY position",
            &album.id,
        )
        .await?;
        albums.push(album);
    }
    Ok(albums)
}

async fn replace_album_relations(
    tx: &mut Tx<'_>,
    album_id: &str,
    artist_ids: &[String],
    tracklist: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM album_artists WHERE album_id = ?")
        .bind(album_id)
        .execute(&mut **tx)
        .await?;
    for (position, artist_id) in artist_ids.iter().enumerate() {
        sqlx::query("INSERT INTO album_artists (album_id, artist_id, position) VALUES (?, ?, ?)")
            .bind(album_id)
            .bind(artist_id)
            .bind(position as i64)
            .execute(&mut **tx)
            .await?;
    }

    sqlx::query("DELETE FROM album_tracks WHERE album_id = ?")
        .bind(album_id)
        .execute(&mut **tx)
        .await?;
    for (position, song_id) in tracklist.iter().enumerate() {
        sqlx::query("INSERT INTO album_tracks (album_id, position, song_id) VALUES (?, ?, ?)")
            .bind(album_id)
            .bind(position as i64)
            .bind(song_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

// ============================================================================
// Artists
// ============================================================================

pub async fn create_artist(pool: &SqlitePool, input: &ArtistInput) -> Result<Artist> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO artists (id, name, name_lowercase, image_url, cover_image_url, bio, genres, \
         socials, platform_links) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&input.name)
    .bind(input.name.to_lowercase())
    .bind(&input.image_url)
    .bind(&input.cover_image_url)
    .bind(&input.bio)
    .bind(serde_json::to_string(&input.genres).unwrap_or_else(|_| "[]".to_string()))
    .bind(input.socials.as_ref().map(|v| v.to_string()))
    .bind(input.platform_links.as_ref().map(|v| v.to_string()))
    .execute(pool)
    .await?;

    get_artist(pool, &id)
        .await?
        .ok_or_else(|| Error::Internal("Artist vanished after creation".to_string()))
}

pub async fn update_artist(pool: &SqlitePool, id: &str, input: &ArtistInput) -> Result<Artist> {
    let updated = sqlx::query(
        "UPDATE artists SET name = ?, name_lowercase = ?, image_url = ?, cover_image_url = ?, \
         bio = ?, genres = ?, socials = ?, platform_links = ? WHERE id = ?",
    )
    .bind(&input.name)
    .bind(input.name.to_lowercase())
    .bind(&input.image_url)
    .bind(&input.cover_image_url)
    .bind(&input.bio)
    .bind(serde_json::to_string(&input.genres).unwrap_or_else(|_| "[]".to_string()))
    .bind(input.socials.as_ref().map(|v| v.to_string()))
    .bind(input.platform_links.as_ref().map(|v| v.to_string()))
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(Error::NotFound(format!("Artist not found: {}", id)));
    }

    get_artist(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Artist not found: {}", id)))
}

pub async fn delete_artist(pool: &SqlitePool, id: &str) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM artists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::NotFound(format!("Artist not found: {}", id)));
    }
    Ok(())
}

pub async fn get_artist(pool: &SqlitePool, id: &str) -> Result<Option<Artist>> {
    let row = sqlx::query("SELECT * FROM artists WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(artist_from_row).transpose()
}

pub async fn list_artists(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Artist>> {
    let rows = sqlx::query("SELECT * FROM artists ORDER BY name_lowercase LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    rows.iter().map(artist_from_row).collect()
}

pub async fn search_artists(pool: &SqlitePool, prefix: &str, limit: i64) -> Result<Vec<Artist>> {
    let rows = sqlx::query(
        "SELECT * FROM artists WHERE name_lowercase LIKE ? || '%' ESCAPE '\\' \
         ORDER BY name_lowercase LIMIT ?",
    )
    .bind(like_prefix(&prefix.to_lowercase()))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.iter().map(artist_from_row).collect()
}

// ============================================================================
// Shared helpers
// ============================================================================

async fn linked_ids(pool: &SqlitePool, sql: &str, id: &str) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(sql).bind(id).fetch_all(pool).await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

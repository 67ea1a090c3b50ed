//! Database initialization
//!
//! Opens (creating if absent) the SQLite database and applies the schema.
//! Schema creation is idempotent; every statement is `CREATE ... IF NOT
//! EXISTS`, so startup against an existing database is a no-op.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Connect options apply per-connection, so every connection the pool
    // opens enforces foreign keys. WAL allows concurrent readers with one
    // writer.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database for tests. Single connection: every `:memory:`
/// connection is its own database, so the pool must not open a second one.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent).
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_follows_table(pool).await?;
    create_likes_table(pool).await?;
    create_reviews_table(pool).await?;

    // Catalog entity tables
    create_artists_table(pool).await?;
    create_albums_table(pool).await?;
    create_songs_table(pool).await?;

    // Linking tables
    create_song_artists_table(pool).await?;
    create_album_artists_table(pool).await?;
    create_album_tracks_table(pool).await?;
    create_favorites_table(pool).await?;

    create_playlists_table(pool).await?;
    create_playlist_songs_table(pool).await?;

    create_admin_applications_table(pool).await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            uid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT UNIQUE,
            display_name TEXT,
            photo_url TEXT,
            bio TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            is_curator INTEGER NOT NULL DEFAULT 0,
            curator_plan TEXT,
            curator_expires_at INTEGER,
            profile_complete INTEGER NOT NULL DEFAULT 0,
            followers_count INTEGER NOT NULL DEFAULT 0,
            following_count INTEGER NOT NULL DEFAULT 0,
            socials TEXT,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            uid TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_follows_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            following_id TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (follower_id, following_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_follows_follower_created \
         ON follows(follower_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_likes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS likes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            entity_title TEXT,
            entity_cover_art_url TEXT,
            review_on_entity_type TEXT,
            review_on_entity_id TEXT,
            review_on_entity_title TEXT,
            created_at INTEGER NOT NULL,
            UNIQUE (user_id, entity_type, entity_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_likes_user_created ON likes(user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_likes_entity ON likes(entity_type, entity_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            user_display_name TEXT,
            user_photo_url TEXT,
            rating INTEGER NOT NULL,
            review_text TEXT NOT NULL DEFAULT '',
            likes_count INTEGER NOT NULL DEFAULT 0,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            entity_title TEXT,
            entity_cover_art_url TEXT,
            created_at INTEGER NOT NULL,
            UNIQUE (user_id, entity_type, entity_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reviews_user_created ON reviews(user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reviews_entity ON reviews(entity_type, entity_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_lowercase TEXT NOT NULL,
            image_url TEXT,
            cover_image_url TEXT,
            bio TEXT,
            genres TEXT,
            socials TEXT,
            platform_links TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_artists_name ON artists(name_lowercase)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_albums_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS albums (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            title_lowercase TEXT NOT NULL,
            release_date TEXT,
            cover_art_url TEXT,
            genre TEXT,
            associated_film TEXT,
            platform_links TEXT,
            review_count INTEGER NOT NULL DEFAULT 0,
            likes_count INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_albums_title ON albums(title_lowercase)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_albums_release ON albums(release_date DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            title_lowercase TEXT NOT NULL,
            album_id TEXT REFERENCES albums(id) ON DELETE SET NULL,
            duration_secs INTEGER NOT NULL DEFAULT 0,
            release_date TEXT,
            genre TEXT,
            credits TEXT,
            cover_art_url TEXT,
            platform_links TEXT,
            review_count INTEGER NOT NULL DEFAULT 0,
            likes_count INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_title ON songs(title_lowercase)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_song_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_artists (
            song_id TEXT NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            artist_id TEXT NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (song_id, artist_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_album_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS album_artists (
            album_id TEXT NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
            artist_id TEXT NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (album_id, artist_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_album_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS album_tracks (
            album_id TEXT NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            song_id TEXT NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            PRIMARY KEY (album_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_favorites_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorites (
            user_id TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            entity_type TEXT NOT NULL,
            position INTEGER NOT NULL,
            entity_id TEXT NOT NULL,
            PRIMARY KEY (user_id, entity_type, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_playlists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            platform_links TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_playlist_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist_songs (
            playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            song_id TEXT NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            PRIMARY KEY (playlist_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_admin_applications_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admin_applications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            message TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'pending',
            created_at INTEGER NOT NULL,
            reviewed_by TEXT,
            reviewed_at INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One open application per user; decided ones don't block a re-apply
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_admin_applications_pending \
         ON admin_applications(user_id) WHERE status = 'pending'",
    )
    .execute(pool)
    .await?;

    Ok(())
}

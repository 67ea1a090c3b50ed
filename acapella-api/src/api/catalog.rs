//! Catalog endpoints
//!
//! Reads are public; writes require an admin role, checked server-side in
//! each handler. Genres are validated against the closed genre list.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use acapella_common::db::models::{Album, Artist, Song, UserProfile};
use acapella_common::genres;

use crate::api::auth::require_catalog_admin;
use crate::db::catalog::{self, AlbumInput, ArtistInput, SongInput};
use crate::error::ApiError;
use crate::AppState;

const BROWSE_LIMIT: i64 = 20;

fn validate_genre(genre: Option<&str>) -> Result<(), ApiError> {
    if let Some(g) = genre {
        if !genres::is_valid_genre(g) {
            return Err(ApiError::invalid(format!("Unknown genre: {}", g)));
        }
    }
    Ok(())
}

fn validate_genres(list: &[String]) -> Result<(), ApiError> {
    for g in list {
        validate_genre(Some(g))?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    fn bounds(&self) -> (i64, i64) {
        (
            self.limit.unwrap_or(50).clamp(1, 200),
            self.offset.unwrap_or(0).max(0),
        )
    }
}

// ============================================================================
// Songs
// ============================================================================

/// GET /api/songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Song>, ApiError> {
    catalog::get_song(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Song not found: {}", id)))
}

/// GET /api/songs
pub async fn list_songs(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let (limit, offset) = q.bounds();
    Ok(Json(catalog::list_songs(&state.db, limit, offset).await?))
}

/// POST /api/songs (admin)
pub async fn create_song(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(input): Json<SongInput>,
) -> Result<Json<Song>, ApiError> {
    require_catalog_admin(&user)?;
    validate_genre(input.genre.as_deref())?;
    let song = catalog::create_song(&state.db, &input).await?;
    info!("Song created: {} ({})", song.title, song.id);
    Ok(Json(song))
}

/// PUT /api/songs/:id (admin)
pub async fn update_song(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
    Json(input): Json<SongInput>,
) -> Result<Json<Song>, ApiError> {
    require_catalog_admin(&user)?;
    validate_genre(input.genre.as_deref())?;
    Ok(Json(catalog::update_song(&state.db, &id, &input).await?))
}

/// DELETE /api/songs/:id (admin)
pub async fn delete_song(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_catalog_admin(&user)?;
    catalog::delete_song(&state.db, &id).await?;
    info!("Song deleted: {}", id);
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

// ============================================================================
// Albums
// ============================================================================

/// GET /api/albums/:id
pub async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Album>, ApiError> {
    catalog::get_album(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Album not found: {}", id)))
}

/// GET /api/albums
pub async fn list_albums(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Album>>, ApiError> {
    let (limit, offset) = q.bounds();
    Ok(Json(catalog::list_albums(&state.db, limit, offset).await?))
}

/// POST /api/albums (admin)
pub async fn create_album(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(input): Json<AlbumInput>,
) -> Result<Json<Album>, ApiError> {
    require_catalog_admin(&user)?;
    validate_genre(input.genre.as_deref())?;
    let album = catalog::create_album(&state.db, &input).await?;
    info!("Album created: {} ({})", album.title, album.id);
    Ok(Json(album))
}

/// PUT /api/albums/:id (admin)
pub async fn update_album(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
    Json(input): Json<AlbumInput>,
) -> Result<Json<Album>, ApiError> {
    require_catalog_admin(&user)?;
    validate_genre(input.genre.as_deref())?;
    Ok(Json(catalog::update_album(&state.db, &id, &input).await?))
}

/// DELETE /api/albums/:id (admin)
pub async fn delete_album(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_catalog_admin(&user)?;
    catalog::delete_album(&state.db, &id).await?;
    info!("Album deleted: {}", id);
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

// ============================================================================
// Artists
// ============================================================================

/// GET /api/artists/:id
pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Artist>, ApiError> {
    catalog::get_artist(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Artist not found: {}", id)))
}

/// GET /api/artists
pub async fn list_artists(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Artist>>, ApiError> {
    let (limit, offset) = q.bounds();
    Ok(Json(catalog::list_artists(&state.db, limit, offset).await?))
}

/// POST /api/artists (admin)
pub async fn create_artist(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(input): Json<ArtistInput>,
) -> Result<Json<Artist>, ApiError> {
    require_catalog_admin(&user)?;
    validate_genres(&input.genres)?;
    let artist = catalog::create_artist(&state.db, &input).await?;
    info!("Artist created: {} ({})", artist.name, artist.id);
    Ok(Json(artist))
}

/// PUT /api/artists/:id (admin)
pub async fn update_artist(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
    Json(input): Json<ArtistInput>,
) -> Result<Json<Artist>, ApiError> {
    require_catalog_admin(&user)?;
    validate_genres(&input.genres)?;
    Ok(Json(catalog::update_artist(&state.db, &id, &input).await?))
}

/// DELETE /api/artists/:id (admin)
pub async fn delete_artist(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_catalog_admin(&user)?;
    catalog::delete_artist(&state.db, &id).await?;
    info!("Artist deleted: {}", id);
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

// ============================================================================
// Browse surfaces
// ============================================================================

/// GET /api/browse/trending-songs
pub async fn trending_songs(State(state): State<AppState>) -> Result<Json<Vec<Song>>, ApiError> {
    Ok(Json(catalog::trending_songs(&state.db, BROWSE_LIMIT).await?))
}

/// GET /api/browse/new-releases
pub async fn new_releases(State(state): State<AppState>) -> Result<Json<Vec<Album>>, ApiError> {
    Ok(Json(catalog::new_releases(&state.db, BROWSE_LIMIT).await?))
}

/// GET /api/browse/featured-albums
pub async fn featured_albums(State(state): State<AppState>) -> Result<Json<Vec<Album>>, ApiError> {
    Ok(Json(catalog::featured_albums(&state.db, BROWSE_LIMIT).await?))
}

/// GET /api/genres
pub async fn list_genres() -> Json<Vec<&'static str>> {
    Json(genres::GENRES.to_vec())
}

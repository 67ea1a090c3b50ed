//! Search endpoint
//!
//! Prefix match on the lowercase title/name columns, mirroring the
//! range-scan search the catalog indexes support.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use acapella_common::db::models::{Album, Artist, Song};

use crate::db::catalog;
use crate::error::ApiError;
use crate::AppState;

const SEARCH_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub songs: Vec<Song>,
    pub albums: Vec<Album>,
    pub artists: Vec<Artist>,
}

/// GET /api/search?q=...
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let term = query.q.trim();
    if term.is_empty() {
        return Ok(Json(SearchResponse {
            songs: Vec::new(),
            albums: Vec::new(),
            artists: Vec::new(),
        }));
    }

    Ok(Json(SearchResponse {
        songs: catalog::search_songs(&state.db, term, SEARCH_LIMIT).await?,
        albums: catalog::search_albums(&state.db, term, SEARCH_LIMIT).await?,
        artists: catalog::search_artists(&state.db, term, SEARCH_LIMIT).await?,
    }))
}

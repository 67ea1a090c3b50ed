//! acapella-api library - social music catalog service
//!
//! HTTP API over the shared SQLite catalog: accounts and sessions, the
//! follow graph, likes, reviews, activity feeds, playlists, and the
//! admin-managed song/album/artist catalog.

use axum::Router;
use sqlx::SqlitePool;

use acapella_common::config::ServiceConfig;

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolved service configuration
    pub config: ServiceConfig,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: ServiceConfig) -> Self {
        Self { db, config }
    }
}

/// Build application router
///
/// Reads of public content need no session; anything that writes on behalf
/// of a user, or reads the caller's own state, sits behind the bearer-token
/// middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, patch, post, put};

    // Protected routes (require a session)
    let protected = Router::new()
        .route("/api/auth/logout", post(api::auth::logout))
        .route("/api/me", get(api::auth::me))
        .route("/api/me", patch(api::users::update_me))
        .route("/api/follows/:uid", post(api::follows::follow))
        .route("/api/follows/:uid", delete(api::follows::unfollow))
        .route("/api/follows/:uid", get(api::follows::follow_status))
        .route("/api/likes/:entity_type/:entity_id", post(api::likes::like))
        .route(
            "/api/likes/:entity_type/:entity_id",
            delete(api::likes::unlike),
        )
        .route("/api/reviews", post(api::reviews::create))
        .route("/api/reviews/:id", delete(api::reviews::delete))
        .route("/api/feed/home", get(api::feed::home))
        .route("/api/playlists", post(api::playlists::create))
        .route("/api/playlists/:id", put(api::playlists::update))
        .route("/api/playlists/:id", delete(api::playlists::delete))
        .route("/api/curator/subscribe", post(api::users::curator_subscribe))
        .route("/api/admin/users/:uid/role", post(api::users::set_role))
        .route(
            "/api/admin-applications",
            post(api::applications::submit).get(api::applications::list),
        )
        .route(
            "/api/admin-applications/:id/approve",
            post(api::applications::approve),
        )
        .route(
            "/api/admin-applications/:id/reject",
            post(api::applications::reject),
        )
        .route("/api/songs", post(api::catalog::create_song))
        .route("/api/songs/:id", put(api::catalog::update_song))
        .route("/api/songs/:id", delete(api::catalog::delete_song))
        .route("/api/albums", post(api::catalog::create_album))
        .route("/api/albums/:id", put(api::catalog::update_album))
        .route("/api/albums/:id", delete(api::catalog::delete_album))
        .route("/api/artists", post(api::catalog::create_artist))
        .route("/api/artists/:id", put(api::catalog::update_artist))
        .route("/api/artists/:id", delete(api::catalog::delete_artist))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no session required)
    let public = Router::new()
        .route("/api/auth/signup", post(api::auth::signup))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/username-check", get(api::users::check_username))
        .route("/api/users/:username", get(api::users::get_profile))
        .route(
            "/api/users/:username/followers",
            get(api::users::list_followers),
        )
        .route(
            "/api/users/:username/following",
            get(api::users::list_following),
        )
        .route(
            "/api/users/:username/activity",
            get(api::feed::user_activity),
        )
        .route(
            "/api/users/:username/reviews",
            get(api::reviews::list_by_user),
        )
        .route("/api/users/:username/likes", get(api::likes::user_likes))
        .route(
            "/api/users/:username/playlists",
            get(api::playlists::list_by_user),
        )
        .route("/api/playlists/:id", get(api::playlists::get))
        .route("/api/songs", get(api::catalog::list_songs))
        .route("/api/songs/:id", get(api::catalog::get_song))
        .route("/api/albums", get(api::catalog::list_albums))
        .route("/api/albums/:id", get(api::catalog::get_album))
        .route("/api/artists", get(api::catalog::list_artists))
        .route("/api/artists/:id", get(api::catalog::get_artist))
        .route(
            "/api/browse/trending-songs",
            get(api::catalog::trending_songs),
        )
        .route("/api/browse/new-releases", get(api::catalog::new_releases))
        .route(
            "/api/browse/featured-albums",
            get(api::catalog::featured_albums),
        )
        .route("/api/genres", get(api::catalog::list_genres))
        .route("/api/search", get(api::search::search))
        .route("/api/reviews", get(api::reviews::list_for_entity))
        .route("/api/reviews/:id", get(api::reviews::get))
        .route(
            "/api/:entity_type/:entity_id/likers",
            get(api::likes::likers),
        )
        .merge(api::health_routes());

    // Combine routers
    Router::new()
        .merge(protected)
        .merge(public)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}

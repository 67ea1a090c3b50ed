//! HTTP API handlers

pub mod applications;
pub mod auth;
pub mod catalog;
pub mod feed;
pub mod follows;
pub mod health;
pub mod likes;
pub mod playlists;
pub mod reviews;
pub mod search;
pub mod users;

pub use auth::auth_middleware;
pub use health::health_routes;

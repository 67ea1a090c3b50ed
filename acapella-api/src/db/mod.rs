//! Data access layer
//!
//! All writes that touch a denormalized counter run inside a transaction
//! with the row change that justifies them.

pub mod applications;
pub mod catalog;
pub mod feed;
pub mod follows;
pub mod likes;
pub mod playlists;
pub mod reviews;
pub mod sessions;
pub mod users;

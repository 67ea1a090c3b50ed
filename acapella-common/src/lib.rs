//! Shared types and infrastructure for the Acapella backend
//!
//! Holds everything both the API service and its tests need: the error
//! taxonomy, configuration resolution, database initialization and schema,
//! the domain models, the reserved-slug list, and username generation rules.

pub mod config;
pub mod db;
pub mod error;
pub mod genres;
pub mod slugs;
pub mod time;
pub mod username;

pub use error::{Error, Result};

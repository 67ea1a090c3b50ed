//! Database models
//!
//! All timestamps are Unix epoch milliseconds. JSON-valued columns
//! (platform links, credits, socials) are stored as TEXT and surfaced as
//! `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User role, in ascending privilege order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Artist,
    Admin,
    MasterAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Artist => "artist",
            Role::Admin => "admin",
            Role::MasterAdmin => "master_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "artist" => Some(Role::Artist),
            "admin" => Some(Role::Admin),
            "master_admin" => Some(Role::MasterAdmin),
            _ => None,
        }
    }

    /// Catalog writes (songs/albums/artists) require admin privileges.
    pub fn can_manage_catalog(&self) -> bool {
        matches!(self, Role::Admin | Role::MasterAdmin)
    }
}

/// Kind of entity a like or review can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Song,
    Album,
    Review,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Song => "song",
            EntityKind::Album => "album",
            EntityKind::Review => "review",
        }
    }

    pub fn parse(s: &str) -> Option<EntityKind> {
        match s {
            "song" => Some(EntityKind::Song),
            "album" => Some(EntityKind::Album),
            "review" => Some(EntityKind::Review),
            _ => None,
        }
    }

    /// Only songs and albums accept reviews.
    pub fn reviewable(&self) -> bool {
        matches!(self, EntityKind::Song | EntityKind::Album)
    }
}

/// Public profile record. Credential columns never leave the db layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
    pub is_curator: bool,
    pub curator_plan: Option<String>,
    pub curator_expires_at: Option<i64>,
    pub profile_complete: bool,
    pub followers_count: i64,
    pub following_count: i64,
    pub socials: Option<Value>,
    pub favorite_song_ids: Vec<String>,
    pub favorite_album_ids: Vec<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub title_lowercase: String,
    pub artist_ids: Vec<String>,
    pub album_id: Option<String>,
    pub duration_secs: i64,
    pub release_date: Option<String>,
    pub genre: Option<String>,
    pub credits: Option<Value>,
    pub cover_art_url: Option<String>,
    pub platform_links: Option<Value>,
    pub review_count: i64,
    pub likes_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub title_lowercase: String,
    pub artist_ids: Vec<String>,
    pub release_date: Option<String>,
    pub cover_art_url: Option<String>,
    pub genre: Option<String>,
    pub associated_film: Option<String>,
    pub platform_links: Option<Value>,
    pub tracklist: Vec<String>,
    pub review_count: i64,
    pub likes_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub name_lowercase: String,
    pub image_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub bio: Option<String>,
    pub genres: Vec<String>,
    pub socials: Option<Value>,
    pub platform_links: Option<Value>,
}

/// A rating (1-5) with optional written text, denormalized for feed display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub user_display_name: Option<String>,
    pub user_photo_url: Option<String>,
    pub rating: i64,
    pub review_text: String,
    pub likes_count: i64,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub entity_title: Option<String>,
    pub entity_cover_art_url: Option<String>,
    pub created_at: i64,
}

/// A like row. `id` is deterministic (`{user_id}_{kind}_{entity_id}`) so a
/// user can never hold two likes on the same entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub entity_title: Option<String>,
    pub entity_cover_art_url: Option<String>,
    pub review_on_entity_type: Option<EntityKind>,
    pub review_on_entity_id: Option<String>,
    pub review_on_entity_title: Option<String>,
    pub created_at: i64,
}

/// Directional follow edge. Readable from either side, so the two mirrored
/// subcollection copies of the source system collapse into one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub song_ids: Vec<String>,
    pub platform_links: Option<Value>,
    pub created_at: i64,
}

/// Lifecycle of an admin application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationStatus> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

/// A user's request to be promoted to admin, reviewed by a master admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminApplication {
    pub id: String,
    pub user_id: String,
    /// Applicant's username, joined in for display.
    pub username: Option<String>,
    pub message: String,
    pub status: ApplicationStatus,
    pub created_at: i64,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<i64>,
}

/// Kind of entry in a merged activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Review,
    Like,
    Follow,
}

/// One entry of a merged activity feed, flattened so every variant renders
/// from the same denormalized fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityItem {
    pub activity_type: ActivityType,
    pub id: String,
    pub user_id: String,
    pub user_display_name: Option<String>,
    pub user_photo_url: Option<String>,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_title: Option<String>,
    pub entity_cover_art_url: Option<String>,
    /// Username of the followed user, for follow entries
    pub entity_username: Option<String>,
    pub rating: Option<i64>,
    pub review_text: Option<String>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::User, Role::Artist, Role::Admin, Role::MasterAdmin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_role_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::MasterAdmin).unwrap();
        assert_eq!(json, "\"master_admin\"");
    }

    #[test]
    fn test_entity_kind_reviewable() {
        assert!(EntityKind::Song.reviewable());
        assert!(EntityKind::Album.reviewable());
        assert!(!EntityKind::Review.reviewable());
    }
}

//! User profile storage: creation, lookups, profile edits, favorites
//!
//! Username uniqueness is enforced by the UNIQUE constraint on
//! `users.username`; the generation loop treats a constraint violation as
//! "taken, try the next candidate", so two concurrent first sign-ins with the
//! same base name can never both win the same handle.

use acapella_common::db::models::{Role, UserProfile};
use acapella_common::time::now_ms;
use acapella_common::{username, Error, Result};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::sessions;

const PROFILE_COLUMNS: &str = "uid, username, email, display_name, photo_url, bio, role, \
     is_curator, curator_plan, curator_expires_at, profile_complete, \
     followers_count, following_count, socials, created_at";

/// Map a `users` row onto the public profile model. Favorites are loaded
/// separately (list queries leave them empty).
fn profile_from_row(row: &SqliteRow) -> Result<UserProfile> {
    let role_str: String = row.try_get("role")?;
    let socials_raw: Option<String> = row.try_get("socials")?;

    Ok(UserProfile {
        uid: row.try_get("uid")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        photo_url: row.try_get("photo_url")?,
        bio: row.try_get("bio")?,
        role: Role::parse(&role_str)
            .ok_or_else(|| Error::Internal(format!("Unknown role in database: {}", role_str)))?,
        is_curator: row.try_get::<i64, _>("is_curator")? != 0,
        curator_plan: row.try_get("curator_plan")?,
        curator_expires_at: row.try_get("curator_expires_at")?,
        profile_complete: row.try_get::<i64, _>("profile_complete")? != 0,
        followers_count: row.try_get("followers_count")?,
        following_count: row.try_get("following_count")?,
        socials: socials_raw.and_then(|s| serde_json::from_str::<Value>(&s).ok()),
        favorite_song_ids: Vec::new(),
        favorite_album_ids: Vec::new(),
        created_at: row.try_get("created_at")?,
    })
}

fn is_username_collision(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.message().contains("users.username")
        }
        _ => false,
    }
}

/// Create an account and synthesize its profile on first sign-up.
///
/// The generated username starts from the email local part (or display
/// name), probes with random 3-digit suffixes on collision, and falls back
/// to a UUID-derived handle after the bounded retry budget is exhausted.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    display_name: Option<&str>,
    master_admin_emails: &[String],
) -> Result<UserProfile> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::InvalidInput("A valid email is required.".to_string()));
    }
    if password.len() < 8 {
        return Err(Error::InvalidInput(
            "Password must be at least 8 characters.".to_string(),
        ));
    }

    let existing: Option<(String,)> = sqlx::query_as("SELECT uid FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict(
            "An account with this email already exists.".to_string(),
        ));
    }

    let uid = Uuid::new_v4().to_string();
    let role = if master_admin_emails.iter().any(|m| m == &email) {
        Role::MasterAdmin
    } else {
        Role::User
    };
    let salt = sessions::generate_salt();
    let password_hash = sessions::hash_password(password, &salt);
    let created_at = now_ms();

    let base = username::derive_base(Some(&email), display_name);
    let mut attempt: u32 = 0;
    loop {
        let candidate = if attempt == 0 {
            base.clone()
        } else if attempt <= username::MAX_GENERATION_ATTEMPTS {
            username::candidate_with_suffix(&base)
        } else {
            username::fallback_handle()
        };

        let result = sqlx::query(
            "INSERT INTO users (uid, username, email, display_name, photo_url, role, \
             profile_complete, followers_count, following_count, \
             password_hash, password_salt, created_at) \
             VALUES (?, ?, ?, ?, NULL, ?, 0, 0, 0, ?, ?, ?)",
        )
        .bind(&uid)
        .bind(&candidate)
        .bind(&email)
        .bind(display_name)
        .bind(role.as_str())
        .bind(&password_hash)
        .bind(&salt)
        .bind(created_at)
        .execute(pool)
        .await;

        match result {
            Ok(_) => break,
            Err(e) if is_username_collision(&e) => {
                if attempt > username::MAX_GENERATION_ATTEMPTS {
                    // UUID-derived handle collided: practically unreachable
                    return Err(Error::Internal(
                        "Could not allocate a unique username.".to_string(),
                    ));
                }
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    get_by_uid(pool, &uid)
        .await?
        .ok_or_else(|| Error::Internal("User vanished after creation".to_string()))
}

/// Verify credentials and return the profile, or `Unauthorized`.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<UserProfile> {
    let email = email.trim().to_lowercase();
    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT uid, password_hash, password_salt FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(pool)
            .await?;

    let (uid, stored_hash, salt) = row.ok_or_else(invalid_credentials)?;
    if !sessions::verify_password(password, &salt, &stored_hash) {
        return Err(invalid_credentials());
    }

    get_by_uid(pool, &uid)
        .await?
        .ok_or_else(invalid_credentials)
}

fn invalid_credentials() -> Error {
    Error::Unauthorized("Invalid email or password.".to_string())
}

pub async fn get_by_uid(pool: &SqlitePool, uid: &str) -> Result<Option<UserProfile>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE uid = ?", PROFILE_COLUMNS))
        .bind(uid)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let mut profile = profile_from_row(&row)?;
            load_favorites(pool, &mut profile).await?;
            Ok(Some(profile))
        }
        None => Ok(None),
    }
}

pub async fn get_by_username(pool: &SqlitePool, name: &str) -> Result<Option<UserProfile>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE username = ?",
        PROFILE_COLUMNS
    ))
    .bind(name.to_lowercase())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let mut profile = profile_from_row(&row)?;
            load_favorites(pool, &mut profile).await?;
            Ok(Some(profile))
        }
        None => Ok(None),
    }
}

/// True when no user holds the given username.
pub async fn username_available(pool: &SqlitePool, name: &str) -> Result<bool> {
    let row: Option<(String,)> = sqlx::query_as("SELECT uid FROM users WHERE username = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_none())
}

/// Profile fields editable by their owner.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub socials: Option<Value>,
    pub favorite_song_ids: Option<Vec<String>>,
    pub favorite_album_ids: Option<Vec<String>>,
}

/// Apply a profile edit and mark the profile complete. Username changes ride
/// the UNIQUE constraint; a lost race maps to `Conflict`.
pub async fn update_profile(
    pool: &SqlitePool,
    uid: &str,
    update: ProfileUpdate,
) -> Result<UserProfile> {
    if let Some(name) = &update.username {
        username::validate(name)?;
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE users SET \
             display_name = COALESCE(?, display_name), \
             username = COALESCE(?, username), \
             photo_url = COALESCE(?, photo_url), \
             bio = COALESCE(?, bio), \
             socials = COALESCE(?, socials), \
             profile_complete = 1 \
         WHERE uid = ?",
    )
    .bind(&update.display_name)
    .bind(&update.username)
    .bind(&update.photo_url)
    .bind(&update.bio)
    .bind(update.socials.as_ref().map(|v| v.to_string()))
    .bind(uid)
    .execute(&mut *tx)
    .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => {
            return Err(Error::NotFound("User not found".to_string()));
        }
        Ok(_) => {}
        Err(e) if is_username_collision(&e) => {
            return Err(Error::Conflict(
                "This username is already taken.".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(song_ids) = &update.favorite_song_ids {
        replace_favorites(&mut tx, uid, "song", song_ids).await?;
    }
    if let Some(album_ids) = &update.favorite_album_ids {
        replace_favorites(&mut tx, uid, "album", album_ids).await?;
    }

    tx.commit().await?;

    get_by_uid(pool, uid)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
}

/// Record curator membership on the profile.
pub async fn set_curator(
    pool: &SqlitePool,
    uid: &str,
    plan: &str,
    expires_at: i64,
) -> Result<UserProfile> {
    sqlx::query(
        "UPDATE users SET is_curator = 1, curator_plan = ?, curator_expires_at = ? WHERE uid = ?",
    )
    .bind(plan)
    .bind(expires_at)
    .bind(uid)
    .execute(pool)
    .await?;

    get_by_uid(pool, uid)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
}

async fn replace_favorites(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    uid: &str,
    entity_type: &str,
    ids: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM favorites WHERE user_id = ? AND entity_type = ?")
        .bind(uid)
        .bind(entity_type)
        .execute(&mut **tx)
        .await?;

    for (position, id) in ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO favorites (user_id, entity_type, position, entity_id) VALUES (?, ?, ?, ?)",
        )
        .bind(uid)
        .bind(entity_type)
        .bind(position as i64)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn load_favorites(pool: &SqlitePool, profile: &mut UserProfile) -> Result<()> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT entity_type, entity_id FROM favorites \
         WHERE user_id = ? ORDER BY entity_type, position",
    )
    .bind(&profile.uid)
    .fetch_all(pool)
    .await?;

    for (entity_type, entity_id) in rows {
        match entity_type.as_str() {
            "song" => profile.favorite_song_ids.push(entity_id),
            "album" => profile.favorite_album_ids.push(entity_id),
            _ => {}
        }
    }

    Ok(())
}

/// Profiles for a list of uids, in no particular order. Favorites are not
/// loaded for list reads.
pub async fn get_profiles_by_uids(pool: &SqlitePool, uids: &[String]) -> Result<Vec<UserProfile>> {
    if uids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; uids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM users WHERE uid IN ({})",
        PROFILE_COLUMNS, placeholders
    );

    let mut query = sqlx::query(&sql);
    for uid in uids {
        query = query.bind(uid);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(profile_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use acapella_common::db::init_memory_database;

    #[tokio::test]
    async fn test_create_user_generates_username_from_email() {
        let pool = init_memory_database().await.unwrap();
        let profile = create_user(&pool, "Jane.Doe@example.com", "password1", None, &[])
            .await
            .unwrap();
        assert_eq!(profile.username, "janedoe");
        assert_eq!(profile.role, Role::User);
        assert!(!profile.profile_complete);
        assert_eq!(profile.followers_count, 0);
    }

    #[tokio::test]
    async fn test_create_user_collision_gets_suffixed_handle() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, "bob@example.com", "password1", None, &[])
            .await
            .unwrap();
        let second = create_user(&pool, "bob@other.com", "password1", None, &[])
            .await
            .unwrap();

        assert_ne!(second.username, "bob");
        assert!(second.username.starts_with("bob"));
        assert!(username::validate(&second.username).is_ok());
    }

    #[tokio::test]
    async fn test_create_user_never_takes_reserved_slug() {
        let pool = init_memory_database().await.unwrap();
        let profile = create_user(&pool, "admin@example.com", "password1", None, &[])
            .await
            .unwrap();
        assert_ne!(profile.username, "admin");
        assert!(username::validate(&profile.username).is_ok());
    }

    #[tokio::test]
    async fn test_master_admin_email_elevated() {
        let pool = init_memory_database().await.unwrap();
        let admins = vec!["root@example.com".to_string()];
        let profile = create_user(&pool, "Root@Example.com", "password1", None, &admins)
            .await
            .unwrap();
        assert_eq!(profile.role, Role::MasterAdmin);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, "dup@example.com", "password1", None, &[])
            .await
            .unwrap();
        let err = create_user(&pool, "dup@example.com", "password2", None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, "carol@example.com", "password1", None, &[])
            .await
            .unwrap();

        assert!(authenticate(&pool, "carol@example.com", "password1").await.is_ok());
        assert!(matches!(
            authenticate(&pool, "carol@example.com", "wrong").await,
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(
            authenticate(&pool, "nobody@example.com", "password1").await,
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile_username_conflict() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, "a@example.com", "password1", None, &[]).await.unwrap();
        let b = create_user(&pool, "b@example.com", "password1", None, &[]).await.unwrap();

        let err = update_profile(
            &pool,
            &b.uid,
            ProfileUpdate {
                username: Some("a".repeat(3)),
                ..Default::default()
            },
        )
        .await;
        // "aaa" is free, so this succeeds; taking "a"'s handle must not
        let err2 = update_profile(
            &pool,
            &b.uid,
            ProfileUpdate {
                username: Some("a".to_string().repeat(1)),
                ..Default::default()
            },
        )
        .await;
        assert!(err.is_ok());
        assert!(err2.is_err()); // too short

        let err3 = update_profile(
            &pool,
            &b.uid,
            ProfileUpdate {
                username: Some("admin".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err3, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_favorites_round_trip() {
        let pool = init_memory_database().await.unwrap();
        let user = create_user(&pool, "fav@example.com", "password1", None, &[])
            .await
            .unwrap();

        let updated = update_profile(
            &pool,
            &user.uid,
            ProfileUpdate {
                favorite_song_ids: Some(vec!["s2".to_string(), "s1".to_string()]),
                favorite_album_ids: Some(vec!["al1".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.favorite_song_ids, vec!["s2", "s1"]);
        assert_eq!(updated.favorite_album_ids, vec!["al1"]);
    }
}

//! Username rules: validation, base derivation, collision candidates
//!
//! Pure functions only; the availability probe against the database lives in
//! the API crate. A username is 3+ characters of `[a-z0-9_.]` and must not
//! shadow an application route (see [`crate::slugs`]).

use crate::slugs;
use crate::{Error, Result};
use rand::Rng;
use uuid::Uuid;

/// Maximum availability probes before falling back to a UUID-derived handle.
pub const MAX_GENERATION_ATTEMPTS: u32 = 10;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 30;

/// Validate a username chosen by a user.
pub fn validate(name: &str) -> Result<()> {
    if name.len() < MIN_LEN {
        return Err(Error::InvalidInput(
            "Username must be at least 3 characters.".to_string(),
        ));
    }
    if name.len() > MAX_LEN {
        return Err(Error::InvalidInput(
            "Username must be at most 30 characters.".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
    {
        return Err(Error::InvalidInput(
            "Only lowercase letters, numbers, underscores, and periods are allowed.".to_string(),
        ));
    }
    if slugs::is_reserved(name) {
        return Err(Error::InvalidInput("This username is reserved.".to_string()));
    }
    Ok(())
}

/// Derive a base handle from an email address or display name.
///
/// Takes the local part of an email, lowercases, and strips everything
/// outside `[a-z0-9]`. Too-short or reserved results fall back to the
/// UUID-derived handle so the caller always starts from a valid base.
pub fn derive_base(email: Option<&str>, display_name: Option<&str>) -> String {
    let raw = email
        .and_then(|e| e.split('@').next())
        .filter(|s| !s.is_empty())
        .or(display_name)
        .unwrap_or("");

    let base: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    if base.len() < MIN_LEN || slugs::is_reserved(&base) {
        fallback_handle()
    } else {
        base.chars().take(MAX_LEN).collect()
    }
}

/// Next collision candidate: base truncated to leave room, plus a random
/// 3-digit suffix.
pub fn candidate_with_suffix(base: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(100..1000);
    let head: String = base.chars().take(MAX_LEN - 3).collect();
    format!("{}{}", head, suffix)
}

/// Last-resort handle when every suffixed candidate collides.
pub fn fallback_handle() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("user{}", &id[..8])
}

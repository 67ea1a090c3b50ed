//! Reserved path segments that usernames must never collide with
//!
//! Profile pages are served at `/{username}`, so a username equal to any
//! application route would shadow that route. Checked server-side on every
//! username write.

/// Path segments unavailable as usernames.
pub const RESERVED_SLUGS: &[&str] = &[
    "login",
    "discover",
    "songs",
    "albums",
    "artists",
    "settings",
    "admin",
    "apply-for-admin",
    "profile",
    "search",
    "library",
    "api",
    "legal",
    "privacy",
    "terms",
    "contact",
    "about",
    "help",
    "new",
    "popular",
    "trending",
    "curator-program",
];

/// Case-insensitive reserved-slug check.
pub fn is_reserved(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RESERVED_SLUGS.iter().any(|s| *s == lower)
}

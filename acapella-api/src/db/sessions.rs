//! Session and credential storage
//!
//! Bearer tokens are random 32-byte hex strings; only their SHA-256 digest
//! is persisted, so a leaked database cannot be replayed against the API.
//! Passwords are stored as SHA-256 over a per-user random salt.

use acapella_common::time::now_ms;
use acapella_common::Result;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Fresh per-user password salt.
pub fn generate_salt() -> String {
    random_hex(16)
}

/// Salted password digest.
pub fn hash_password(password: &str, salt: &str) -> String {
    sha256_hex(&format!("{}{}", salt, password))
}

/// Constant-shape verification against the stored digest.
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    hash_password(password, salt) == stored_hash
}

/// Create a session row and return the bearer token (shown to the client
/// exactly once).
pub async fn create_session(pool: &SqlitePool, uid: &str) -> Result<String> {
    let token = random_hex(32);
    sqlx::query("INSERT INTO sessions (token_hash, uid, created_at) VALUES (?, ?, ?)")
        .bind(sha256_hex(&token))
        .bind(uid)
        .bind(now_ms())
        .execute(pool)
        .await?;
    Ok(token)
}

/// Resolve a bearer token to the owning uid, if the session exists.
pub async fn lookup_session(pool: &SqlitePool, token: &str) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT uid FROM sessions WHERE token_hash = ?")
            .bind(sha256_hex(token))
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(uid,)| uid))
}

/// Delete the session for a bearer token (logout). Unknown tokens are a
/// no-op.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(sha256_hex(token))
        .execute(pool)
        .await?;
    Ok(())
}

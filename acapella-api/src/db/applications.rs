//! Admin application storage
//!
//! A user asks to become an admin; a master admin approves or rejects. One
//! open application per user, enforced by a partial unique index on
//! (user_id) WHERE status = 'pending', so a decided application never blocks
//! a re-apply.

use acapella_common::db::models::{AdminApplication, ApplicationStatus, Role, UserProfile};
use acapella_common::time::now_ms;
use acapella_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

fn application_from_row(row: &SqliteRow) -> Result<AdminApplication> {
    let status: String = row.try_get("status")?;
    Ok(AdminApplication {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username").ok(),
        message: row.try_get("message")?,
        status: ApplicationStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown application status: {}", status)))?,
        created_at: row.try_get("created_at")?,
        reviewed_by: row.try_get("reviewed_by")?,
        reviewed_at: row.try_get("reviewed_at")?,
    })
}

fn is_pending_collision(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.message().contains("admin_applications")
        }
        _ => false,
    }
}

/// File an application on behalf of the given user.
pub async fn submit(
    pool: &SqlitePool,
    applicant: &UserProfile,
    message: &str,
) -> Result<AdminApplication> {
    if applicant.role.can_manage_catalog() {
        return Err(Error::InvalidInput("You are already an admin.".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let result = sqlx::query(
        "INSERT INTO admin_applications (id, user_id, message, status, created_at) \
         VALUES (?, ?, ?, 'pending', ?)",
    )
    .bind(&id)
    .bind(&applicant.uid)
    .bind(message.trim())
    .bind(now_ms())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_pending_collision(&e) => {
            return Err(Error::Conflict(
                "You already have a pending application.".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    get_application(pool, &id)
        .await?
        .ok_or_else(|| Error::Internal("Application vanished after creation".to_string()))
}

pub async fn get_application(pool: &SqlitePool, id: &str) -> Result<Option<AdminApplication>> {
    let row = sqlx::query(
        "SELECT a.*, u.username FROM admin_applications a \
         JOIN users u ON u.uid = a.user_id WHERE a.id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(application_from_row).transpose()
}

/// Applications filtered by status (or all of them), newest first.
pub async fn list(
    pool: &SqlitePool,
    status: Option<ApplicationStatus>,
) -> Result<Vec<AdminApplication>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(
                "SELECT a.*, u.username FROM admin_applications a \
                 JOIN users u ON u.uid = a.user_id \
                 WHERE a.status = ? ORDER BY a.created_at DESC",
            )
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT a.*, u.username FROM admin_applications a \
                 JOIN users u ON u.uid = a.user_id ORDER BY a.created_at DESC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    rows.iter().map(application_from_row).collect()
}

/// Decide a pending application. Approval promotes the applicant to admin
/// in the same transaction; master admins are never demoted by it.
pub async fn decide(
    pool: &SqlitePool,
    id: &str,
    reviewer_uid: &str,
    approve: bool,
) -> Result<AdminApplication> {
    let status = if approve {
        ApplicationStatus::Approved
    } else {
        ApplicationStatus::Rejected
    };

    let mut tx = pool.begin().await?;

    let application: Option<(String, String)> =
        sqlx::query_as("SELECT user_id, status FROM admin_applications WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let (user_id, current) = application
        .ok_or_else(|| Error::NotFound(format!("Application not found: {}", id)))?;
    if current != ApplicationStatus::Pending.as_str() {
        return Err(Error::Conflict(
            "This application has already been decided.".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE admin_applications SET status = ?, reviewed_by = ?, reviewed_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(reviewer_uid)
    .bind(now_ms())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if approve {
        sqlx::query("UPDATE users SET role = ? WHERE uid = ? AND role IN ('user', 'artist')")
            .bind(Role::Admin.as_str())
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    get_application(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("Application vanished after decision".to_string()))
}

//! Admin application endpoints
//!
//! Any signed-in user may apply; listing and deciding applications is
//! master admin only.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use acapella_common::db::models::{AdminApplication, ApplicationStatus, Role, UserProfile};

use crate::db::applications;
use crate::error::ApiError;
use crate::AppState;

fn require_master_admin(caller: &UserProfile) -> Result<(), ApiError> {
    if caller.role != Role::MasterAdmin {
        return Err(ApiError::forbidden("Master admin privileges required."));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    #[serde(default)]
    pub message: String,
}

/// POST /api/admin-applications
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(req): Json<SubmitApplicationRequest>,
) -> Result<Json<AdminApplication>, ApiError> {
    let application = applications::submit(&state.db, &user, &req.message).await?;
    info!("Admin application filed by {}", user.uid);
    Ok(Json(application))
}

#[derive(Debug, Deserialize)]
pub struct ApplicationListQuery {
    pub status: Option<String>,
}

/// GET /api/admin-applications?status=pending
///
/// Master admin only.
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Query(q): Query<ApplicationListQuery>,
) -> Result<Json<Vec<AdminApplication>>, ApiError> {
    require_master_admin(&caller)?;
    let status = match q.status.as_deref() {
        Some(s) => Some(
            ApplicationStatus::parse(s)
                .ok_or_else(|| ApiError::invalid(format!("Unknown status: {}", s)))?,
        ),
        None => None,
    };
    Ok(Json(applications::list(&state.db, status).await?))
}

/// POST /api/admin-applications/:id/approve
///
/// Master admin only. Promotes the applicant to admin.
pub async fn approve(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Path(id): Path<String>,
) -> Result<Json<AdminApplication>, ApiError> {
    require_master_admin(&caller)?;
    let decided = applications::decide(&state.db, &id, &caller.uid, true).await?;
    info!(
        "Admin application {} approved for {} (by {})",
        id, decided.user_id, caller.uid
    );
    Ok(Json(decided))
}

/// POST /api/admin-applications/:id/reject
///
/// Master admin only.
pub async fn reject(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Path(id): Path<String>,
) -> Result<Json<AdminApplication>, ApiError> {
    require_master_admin(&caller)?;
    let decided = applications::decide(&state.db, &id, &caller.uid, false).await?;
    Ok(Json(decided))
}

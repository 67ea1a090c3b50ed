//! HTTP error mapping
//!
//! Handlers return `ApiError`, which renders the shared error taxonomy as a
//! status code plus an `{"error": "..."}` JSON body.

use acapella_common::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Wrapper giving the common error type an HTTP representation.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError(Error::NotFound(msg.into()))
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ApiError(Error::InvalidInput(msg.into()))
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError(Error::Unauthorized(msg.into()))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError(Error::Forbidden(msg.into()))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError(Error::Conflict(msg.into()))
    }
}

impl<E: Into<Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Client-facing variants carry a user-presentable message; render it
        // bare, without the variant prefix Display adds.
        let (status, message) = match self.0 {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::Conflict(msg) => (StatusCode::CONFLICT, msg),
            err => {
                error!("internal error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

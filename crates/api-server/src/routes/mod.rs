//! Route handlers

pub mod calendar;
pub mod dashboard;
pub mod health;
pub mod kanban;
pub mod preferences;
pub mod task;

use axum::{
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::warn;

use taskdeck_core::Error;

/// Header carrying the opaque user id issued by the auth backend
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

pub type RouteError = (StatusCode, Json<ErrorResponse>);

/// Map a core error onto the status the view reacts to
pub fn api_error(error: Error) -> RouteError {
    let status = match &error {
        Error::Unauthenticated => StatusCode::UNAUTHORIZED,
        Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
        Error::TaskNotFound(_) => StatusCode::NOT_FOUND,
        Error::PendingSubtasks(_) => StatusCode::CONFLICT,
        Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Network(_) | Error::MalformedDocument { .. } | Error::Serialization(_) => {
            StatusCode::BAD_GATEWAY
        }
        Error::Storage(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Request failed: {}", error);
    }

    let field = match &error {
        Error::Validation { field, .. } => Some(*field),
        _ => None,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            field,
        }),
    )
}

/// The signed-in user, or 401 so the client redirects to login
pub fn session_user(headers: &HeaderMap) -> Result<String, RouteError> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| api_error(Error::Unauthenticated))
}

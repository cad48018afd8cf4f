//! Guard rejections and their HTTP responses.

use std::fmt;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Build a JSON error response: `{ "error": "<message>" }`.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Why a guarded request did not reach its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Denied; send the client to the login page (302 to this location).
    Redirect(String),
    /// Denied with an authorization error (403).
    Forbidden,
    /// The object named by the request does not exist (404).
    NotFound(String),
    /// The guard itself is misconfigured (500).
    ImproperlyConfigured(String),
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::Redirect(_) => StatusCode::FOUND,
            Rejection::Forbidden => StatusCode::FORBIDDEN,
            Rejection::NotFound(_) => StatusCode::NOT_FOUND,
            Rejection::ImproperlyConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Redirect(location) => write!(f, "Login required: {}", location),
            Rejection::Forbidden => write!(f, "Permission denied"),
            Rejection::NotFound(msg) => write!(f, "Not found: {}", msg),
            Rejection::ImproperlyConfigured(msg) => write!(f, "Improperly configured: {}", msg),
        }
    }
}

impl std::error::Error for Rejection {}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::Redirect(location) => {
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
            Rejection::Forbidden => error_response(StatusCode::FORBIDDEN, "Permission denied"),
            Rejection::NotFound(msg) => error_response(StatusCode::NOT_FOUND, msg),
            Rejection::ImproperlyConfigured(msg) => {
                tracing::error!(error = %msg, "permission guard misconfigured");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

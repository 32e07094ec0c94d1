//! HTTP mapping for the crate error type.
//!
//! Caller mistakes are returned verbatim. Server-side failures are logged
//! with their full detail and the client only sees a generic message.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    error: String,
}

const GENERIC_MESSAGE: &str = "An internal error occurred";

impl Error {
    /// Status code and stable error code for this error.
    #[must_use]
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::SignatureMismatch => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
            Self::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Json(_) => (StatusCode::BAD_REQUEST, "MALFORMED_BODY"),
            Self::AlreadyPaid { .. } => (StatusCode::BAD_REQUEST, "ALREADY_PAID"),
            Self::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            Self::NoChefsAvailable => (StatusCode::SERVICE_UNAVAILABLE, "NO_CHEFS_AVAILABLE"),
            Self::InvalidAssignment { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_ASSIGNMENT")
            }
            Self::Upstream { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_FAILURE"),
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::EnvVar(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            error!(status = %status, code, error = %self, "Request failed");
            GENERIC_MESSAGE.to_string()
        } else if let Self::Json(_) = self {
            "Request body is not valid JSON".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { code, error: message })).into_response()
    }
}

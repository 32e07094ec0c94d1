//! Unified error type for the booking, checkout and payment flows.
//!
//! Validation-style variants carry a message that is safe to show to the caller.
//! Infrastructure variants (`Database`, `Upstream`, `Io`, ...) are logged by the
//! HTTP layer and reduced to a generic message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Booking {booking_id} has already been paid for")]
    AlreadyPaid { booking_id: i64 },

    #[error("Webhook signature verification failed")]
    SignatureMismatch,

    #[error("No chefs available for assignment")]
    NoChefsAvailable,

    #[error("Invalid chef assignment: {message}")]
    InvalidAssignment { message: String },

    #[error("{service} call failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn upstream(service: &'static str, message: impl ToString) -> Self {
        Self::Upstream {
            service,
            message: message.to_string(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

//! Application error taxonomy.
//!
//! Every fallible component produces one of these tagged variants; nothing
//! downstream ever inspects message text to classify a failure. Handlers
//! intercept the variants that need a form re-render with context; the
//! `IntoResponse` impl here is the generic fallback mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::views::{self, DeniedPage};

/// Uniform external message for both wrong-password and unknown-identifier
/// login failures, to avoid account enumeration.
pub const INVALID_CREDENTIALS: &str = "Invalid username/email or password";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// User-correctable input problems; ordered, human-readable messages.
    #[error("{}", messages.join(". "))]
    Validation { messages: Vec<String> },

    /// Username or email already taken; raised by the store's unique
    /// indexes, which are the authoritative check.
    #[error("User already exists with same email or username.")]
    Duplicate,

    #[error("Resource not found")]
    NotFound,

    #[error("Only image files are allowed!")]
    UnsupportedMediaType,

    #[error("File too large. Maximum size is 5MB.")]
    PayloadTooLarge,

    #[error("{INVALID_CREDENTIALS}")]
    InvalidCredentials,

    #[error("Access Denied: Admin privileges required")]
    Forbidden,

    /// Catch-all: logged server-side, generic message to the caller.
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn validation(messages: Vec<String>) -> Self {
        AppError::Validation { messages }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        AppError::Internal(detail.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Duplicate,
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation { messages } => {
                (StatusCode::BAD_REQUEST, messages.join(". ")).into_response()
            }
            AppError::Duplicate => (StatusCode::CONFLICT, self.to_string()).into_response(),
            // A missing record is never an error page; fall back to a safe
            // default view.
            AppError::NotFound => Redirect::to("/").into_response(),
            AppError::UnsupportedMediaType => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, self.to_string()).into_response()
            }
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()).into_response()
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string()).into_response()
            }
            AppError::Forbidden => {
                let page = DeniedPage {
                    message: "Access Denied: Admin privileges required".to_string(),
                };
                (StatusCode::FORBIDDEN, views::render(page)).into_response()
            }
            AppError::Internal(detail) => {
                // The detail never reaches the caller.
                tracing::error!(detail = %detail, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers should return
//! `Result<T, AppError>`.
//!
//! Clients see a JSON body of either `{"error": "..."}` or
//! `{"errors": ["...", ...]}` (the latter for batched per-line failures).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type for the marketplace API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Malformed request shape (bad id, non-positive quantity, empty batch).
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Per-line business errors from a cart batch (add/update/delete).
    ///
    /// Responds 404, matching the upstream API contract which reuses 404
    /// for stock conflicts rather than 409.
    #[error("Cart line errors: {}", .0.join("; "))]
    LineErrors(Vec<String>),

    /// Checkout failed its validation gate; nothing was mutated.
    #[error("Checkout rejected: {}", .0.join("; "))]
    CheckoutRejected(Vec<String>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role.
    #[error("Forbidden")]
    Forbidden,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::CheckoutRejected(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::LineErrors(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        };

        // Don't expose internal error details to clients
        let body = match self {
            Self::Database(_) | Self::Internal(_) => json!({"error": "Internal server error"}),
            Self::Validation(errors) | Self::LineErrors(errors) | Self::CheckoutRejected(errors) => {
                json!({"errors": errors})
            }
            Self::NotFound(msg) | Self::BadRequest(msg) | Self::Unauthorized(msg) => {
                json!({"error": msg})
            }
            Self::Forbidden => json!({"error": "Admin access required"}),
        };

        (status, Json(body)).into_response()
    }
}

impl From<crate::services::CartError> for AppError {
    fn from(err: crate::services::CartError) -> Self {
        match err {
            crate::services::CartError::Lines(errors) => Self::LineErrors(errors),
            crate::services::CartError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<crate::services::CheckoutError> for AppError {
    fn from(err: crate::services::CheckoutError) -> Self {
        match err {
            crate::services::CheckoutError::EmptyCart => Self::NotFound("Cart not found!".to_owned()),
            crate::services::CheckoutError::Rejected(errors) => Self::CheckoutRejected(errors),
            crate::services::CheckoutError::Repository(e) => Self::Database(e),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Cart not found".to_string());
        assert_eq!(err.to_string(), "Not found: Cart not found");

        let err = AppError::Validation(vec!["quantity must be positive".to_string()]);
        assert_eq!(err.to_string(), "Validation failed: quantity must be positive");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation(vec!["bad".into()])),
            StatusCode::BAD_REQUEST
        );
        // Per-line cart errors reuse 404, not 409
        assert_eq!(
            get_status(AppError::LineErrors(vec!["no stock".into()])),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::CheckoutRejected(vec!["no stock".into()])),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("cart".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response = AppError::Internal("connection pool exhausted".into()).into_response();
        // The body is generic; the detail only goes to logs/Sentry
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

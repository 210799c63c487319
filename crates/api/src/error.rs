//! Unified error handling for the API.
//!
//! Provides a unified `AppError` type that every route handler returns in
//! its `Result`. Conversion to an HTTP response happens in one place so the
//! status mapping and the `{ok: false, message}` envelope stay consistent.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Malformed or out-of-range input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required business field is missing.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unique-constraint violation (email, product code, SKU).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request is not authenticated.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but lacking role or ownership.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A cart line asked for more units than the variant holds.
    #[error("Insufficient stock for {product} ({size} / {color}). Available: {available}")]
    InsufficientStock {
        product: String,
        size: String,
        color: String,
        available: i32,
    },

    /// A cart line's asserted unit cost no longer matches the catalog.
    #[error("Price mismatch detected for {product}. Please reload your cart.")]
    PriceMismatch { product: String },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    message: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::TokenExpired
                | AuthError::TokenInvalid
                | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Validation(_)
            | Self::InvalidRequest(_)
            | Self::InsufficientStock { .. }
            | Self::PriceMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn public_message(&self) -> String {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::MissingToken | AuthError::TokenExpired | AuthError::TokenInvalid => {
                    "Not authorized".to_string()
                }
                AuthError::UserAlreadyExists => "Email already used".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(e) => e.to_string(),
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Validation(msg)
            | Self::InvalidRequest(msg)
            | Self::Conflict(msg)
            | Self::Forbidden(msg)
            | Self::Unauthenticated(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::InsufficientStock { .. } | Self::PriceMismatch { .. } => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        }

        let body = ErrorBody {
            ok: false,
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
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
        let err = AppError::NotFound("Product 123".to_string());
        assert_eq!(err.to_string(), "Not found: Product 123");

        let err = AppError::InvalidRequest("cart is empty".to_string());
        assert_eq!(err.to_string(), "Invalid request: cart is empty");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::InvalidRequest("missing".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("dup".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::NotFound("Order".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthenticated("no token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("not yours".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_business_rule_failures_are_400() {
        assert_eq!(
            get_status(AppError::InsufficientStock {
                product: "Linen Shirt".to_string(),
                size: "M".to_string(),
                color: "Blue".to_string(),
                available: 2,
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::PriceMismatch {
                product: "Linen Shirt".to_string(),
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_insufficient_stock_message_reports_available() {
        let err = AppError::InsufficientStock {
            product: "Linen Shirt".to_string(),
            size: "M".to_string(),
            color: "Blue".to_string(),
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Linen Shirt (M / Blue). Available: 2"
        );
    }

    #[test]
    fn test_internal_details_are_suppressed() {
        let err = AppError::Internal("connection pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_auth_conflict_maps_to_409() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_invalid_credentials_indistinguishable_from_unknown_user() {
        let wrong_password = AppError::Auth(AuthError::InvalidCredentials);
        let unknown_user = AppError::Auth(AuthError::UserNotFound);
        assert_eq!(wrong_password.public_message(), unknown_user.public_message());
        assert_eq!(
            StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::UserNotFound).status_code()
        );
    }
}

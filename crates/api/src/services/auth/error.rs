//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] hemline_core::EmailError),

    /// Invalid credentials (wrong password or unknown email - the two are
    /// deliberately indistinguishable).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token refers to a user that no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// No session token on the request.
    #[error("missing session token")]
    MissingToken,

    /// Session token expired.
    #[error("session token expired")]
    TokenExpired,

    /// Session token failed signature or structural validation.
    #[error("invalid session token")]
    TokenInvalid,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

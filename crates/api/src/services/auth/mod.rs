//! Authentication service.
//!
//! Password registration and login, plus session-token resolution for the
//! auth extractors.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{issue_session_token, verify_session_token};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::SecretString;
use sqlx::PgPool;

use hemline_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// A syntactically valid Argon2id PHC string that matches no password.
///
/// Login verifies against this when the email is unknown, so the
/// unknown-email and wrong-password paths do comparable work and stay
/// timing-indistinguishable.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$\
    AAAAAAAAAAAAAAAAAAAAAA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Authentication service.
///
/// Handles user registration, login, and session-token resolution.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    token_secret: &'a SecretString,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, token_secret: &'a SecretString) -> Self {
        Self {
            users: UserRepository::new(pool),
            token_secret,
        }
    }

    /// Register a new user and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet
    /// requirements. Returns `AuthError::UserAlreadyExists` if the email is
    /// already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = issue_session_token(user.id, self.token_secret)?;
        Ok((user, token))
    }

    /// Login with email and password and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email and for
    /// a wrong password alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let Some((user, password_hash)) = self.users.get_with_password_hash(&email).await? else {
            // Burn the same verification work as the known-email path.
            let _ = verify_password(password, DUMMY_HASH);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash)?;

        let token = issue_session_token(user.id, self.token_secret)?;
        Ok((user, token))
    }

    /// Verify a session token and resolve the bound user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` / `AuthError::TokenInvalid` if the
    /// token fails verification, and `AuthError::UserNotFound` if the bound
    /// account no longer exists.
    pub async fn resolve_token(&self, token: &str) -> Result<User, AuthError> {
        let user_id = verify_session_token(token, self.token_secret)?;
        self.get_user(user_id).await
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("correct horse battery").unwrap();
        let err = verify_password("wrong horse battery", &hash).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_password_rejected() {
        let err = validate_password("short").unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
        assert!(validate_password("just long enough").is_ok());
    }

    #[test]
    fn test_dummy_hash_parses_and_matches_nothing() {
        // The anti-enumeration path must run real verification work, so the
        // constant has to be a structurally valid PHC string.
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        let err = verify_password("any password at all", DUMMY_HASH).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}

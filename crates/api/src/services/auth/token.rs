//! Session token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the user ID as subject, valid for a fixed
//! 7 days from issuance and not renewable. There is no server-side
//! revocation: logout clears the client cookie but a captured token stays
//! cryptographically valid until expiry.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use hemline_core::UserId;

use super::AuthError;

/// Session validity window: 7 days, fixed.
pub const TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// JWT claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - user ID.
    pub sub: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Issue a signed session token for a user.
///
/// # Errors
///
/// Returns `AuthError::TokenInvalid` if signing fails (malformed key).
pub fn issue_session_token(user_id: UserId, secret: &SecretString) -> Result<String, AuthError> {
    issue_at(user_id, Utc::now().timestamp(), secret)
}

/// Issue a token with an explicit issued-at instant.
fn issue_at(user_id: UserId, iat: i64, secret: &SecretString) -> Result<String, AuthError> {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        iat,
        exp: iat + TOKEN_TTL_SECONDS,
    };

    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|_| AuthError::TokenInvalid)
}

/// Verify a session token's signature and expiry and return the bound
/// user ID.
///
/// # Errors
///
/// Returns `AuthError::TokenExpired` for an out-of-date token and
/// `AuthError::TokenInvalid` for anything else that fails validation.
pub fn verify_session_token(token: &str, secret: &SecretString) -> Result<UserId, AuthError> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["sub", "exp", "iat"]);

    let claims = jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;

    let id: i32 = claims.sub.parse().map_err(|_| AuthError::TokenInvalid)?;
    Ok(UserId::new(id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_secret() -> SecretString {
        SecretString::from("kX9mP2vQ7rT4wY6zB1nC3dF5gH8jL0aS")
    }

    #[test]
    fn test_token_roundtrip() {
        let secret = test_secret();
        let token = issue_session_token(UserId::new(42), &secret).unwrap();
        let user_id = verify_session_token(&token, &secret).unwrap();
        assert_eq!(user_id, UserId::new(42));
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = test_secret();
        // Issued far enough in the past that the 7-day window (plus the
        // validator's leeway) has elapsed.
        let iat = Utc::now().timestamp() - TOKEN_TTL_SECONDS - 3600;
        let token = issue_at(UserId::new(7), iat, &secret).unwrap();

        let err = verify_session_token(&token, &secret).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let secret = test_secret();
        let token = issue_session_token(UserId::new(7), &secret).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        let err = verify_session_token(&tampered, &secret).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_session_token(UserId::new(7), &test_secret()).unwrap();
        let other = SecretString::from("aQ3xZ8pL5mV2bN7cR4tW9yD6fG1hJ0kE");
        assert!(matches!(
            verify_session_token(&token, &other).unwrap_err(),
            AuthError::TokenInvalid
        ));
    }

    #[test]
    fn test_claims_carry_fixed_ttl() {
        let secret = test_secret();
        let before = Utc::now().timestamp();
        let token = issue_session_token(UserId::new(1), &secret).unwrap();

        let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let claims = jsonwebtoken::decode::<SessionClaims>(&token, &key, &validation)
            .unwrap()
            .claims;

        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECONDS);
        assert!(claims.iat >= before);
    }
}

//! Authentication extractors.
//!
//! Route handlers declare their auth requirement by taking one of these
//! extractors; the extractor verifies the session token from the request's
//! cookies and resolves the acting user. The password hash never reaches
//! the request context.

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};

use crate::error::AppError;
use crate::middleware::session::SESSION_COOKIE_NAME;
use crate::models::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// Rejects with 401 when the session token is absent, invalid, or expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_session(parts, state).await?;
        Ok(Self(user))
    }
}

/// Extractor that optionally resolves the current user.
///
/// Unlike `RequireAuth`, a missing or unusable token yields `None` instead
/// of rejecting the request. Used where guests are first-class callers,
/// e.g. order placement.
pub struct OptionalAuth(pub Option<User>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_session(parts, state).await.ok()))
    }
}

/// Extractor that requires an authenticated admin.
///
/// Rejects with 401 for a missing/invalid session and 403 for an
/// authenticated non-admin.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_session(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_owned()));
        }
        Ok(Self(user))
    }
}

/// Verify the request's session token and load the bound user.
async fn resolve_session(parts: &Parts, state: &AppState) -> Result<User, AppError> {
    let token = session_token(parts).ok_or(AuthError::MissingToken)?;
    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    let user = auth.resolve_token(&token).await?;
    Ok(user)
}

/// Extract the session token from the request's `Cookie` headers.
fn session_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE_NAME)?
                .strip_prefix('=')
                .map(ToOwned::to_owned)
        })
}

//! Authentication routes.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth, clear_session_cookie, session_cookie};
use crate::models::PublicUser;
use crate::services::AuthService;
use crate::state::AppState;

use super::MessageResponse;

/// Request to create an account.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request to authenticate.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response carrying a user projection.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub ok: bool,
    pub message: String,
    pub user: PublicUser,
}

/// Create an account and start a session.
///
/// POST /api/auth/register
///
/// # Errors
///
/// Returns 400 for a missing name, weak password, or malformed email, and
/// 409 when the email is already registered.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_owned()));
    }

    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    let (user, token) = auth.register(name, &req.email, &req.password).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, session_cookie(&token, state.config().is_secure()))],
        Json(UserResponse {
            ok: true,
            message: "Registered".to_owned(),
            user: user.to_public(),
        }),
    ))
}

/// Authenticate and start a session.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 for an unknown email or wrong password - the two are
/// indistinguishable in both message and status.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    let (user, token) = auth.login(&req.email, &req.password).await?;

    Ok((
        [(SET_COOKIE, session_cookie(&token, state.config().is_secure()))],
        Json(UserResponse {
            ok: true,
            message: "Logged in".to_owned(),
            user: user.to_public(),
        }),
    ))
}

/// End the session by clearing the client's cookie.
///
/// POST /api/auth/logout
///
/// The token itself stays valid until its 7-day expiry; there is no
/// server-side revocation.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_session_cookie(state.config().is_secure()))],
        Json(MessageResponse {
            ok: true,
            message: "Logged out".to_owned(),
        }),
    )
}

/// Return the caller's profile.
///
/// GET /api/auth/profile
pub async fn profile(RequireAuth(user): RequireAuth) -> Json<UserResponse> {
    Json(UserResponse {
        ok: true,
        message: "Profile".to_owned(),
        user: user.to_public(),
    })
}

/// Role probe: succeeds only for admins.
///
/// GET /api/auth/admin-check
pub async fn admin_check(RequireAdmin(user): RequireAdmin) -> Json<MessageResponse> {
    Json(MessageResponse {
        ok: true,
        message: format!("{} has admin access", user.name),
    })
}

//! Session cookie construction.
//!
//! The session credential is a signed token carried in an HTTP-only cookie.
//! The cookie's lifetime matches the token's 7-day validity; `Secure` is set
//! only when the public base URL is https, so plain-http development setups
//! keep working.

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "hemline_token";

/// Session cookie lifetime in seconds (7 days, matching the token).
pub const SESSION_TTL_SECONDS: i64 = crate::services::auth::token::TOKEN_TTL_SECONDS;

/// Build the `Set-Cookie` value that installs a session token.
#[must_use]
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; Max-Age={SESSION_TTL_SECONDS}; HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the `Set-Cookie` value that discards the session cookie.
///
/// This only instructs the client to forget the token; the token itself
/// stays valid until expiry.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc.def.ghi", false);
        assert!(cookie.starts_with("hemline_token=abc.def.ghi; "));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_secure_flag_follows_base_url_scheme() {
        assert!(session_cookie("t", true).ends_with("; Secure"));
        assert!(clear_session_cookie(true).ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(false);
        assert!(cookie.starts_with("hemline_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}

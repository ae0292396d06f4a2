use axum_extra::extract::cookie::{Cookie, SameSite};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "auth_session";

/// The cookie itself never expires on its own; the session row does.
const PERSISTENT_COOKIE_MAX_AGE_DAYS: i64 = 400;

/// Builds session cookies with consistent attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionCookies {
    /// Adds the `Secure` attribute. Enable it when served over HTTPS.
    pub secure: bool,
}

impl SessionCookies {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// A cookie that carries the given session token.
    pub fn session_cookie(&self, session_id: &str) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, session_id.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(PERSISTENT_COOKIE_MAX_AGE_DAYS))
            .path("/")
            .build()
    }

    /// An empty, already expired cookie that clears the session on the client.
    pub fn blank_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::ZERO)
            .path("/")
            .build()
    }
}

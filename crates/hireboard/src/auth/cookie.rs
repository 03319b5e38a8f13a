use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::Duration;

pub const SESSION_COOKIE: &str = "auth_token";

/// Builds `Set-Cookie` values for the session carrier. `Max-Age` mirrors the token TTL.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    secure: bool,
    max_age_seconds: i64,
}

impl SessionCookie {
    pub fn new(secure: bool, ttl: Duration) -> Self {
        Self {
            secure,
            max_age_seconds: ttl.num_seconds(),
        }
    }

    pub fn issue(&self, token: &str) -> String {
        self.render(token, self.max_age_seconds)
    }

    /// Empty value that expires immediately.
    pub fn clear(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Reads the session token from every `Cookie` header on the request. An empty value
/// (a cleared cookie echoed back) counts as absent.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

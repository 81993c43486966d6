//! Request authentication.
//!
//! Handlers that need a caller take an [`Authenticated`] argument. The
//! extractor reads `Authorization: Bearer <token>` first and falls back to
//! the `token` cookie, then hands the result to the state's
//! [`AuthProvider`](quill_auth::AuthProvider).

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use quill_auth::{AuthenticatedIdentity, Credentials};
use quill_engine::EngineError;

use crate::error::ApiError;
use crate::state::{AppState, CookiePolicy};

pub const SESSION_COOKIE: &str = "token";

/// The verified caller of a request.
#[derive(Clone, Copy, Debug)]
pub struct Authenticated(pub AuthenticatedIdentity);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credentials = credentials_from(&parts.headers);
        let identity = state
            .auth
            .authenticate(&credentials)
            .await
            .map_err(EngineError::from)?;
        Ok(Self(identity))
    }
}

/// Pull presented credentials out of request headers.
pub fn credentials_from(headers: &HeaderMap) -> Credentials {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Credentials::Bearer(token.to_string());
    }
    match cookie_value(headers, SESSION_COOKIE) {
        Some(token) => Credentials::Cookie(token),
        None => Credentials::Anonymous,
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, policy: CookiePolicy) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        policy.max_age_secs
    );
    if policy.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the session.
pub fn cleared_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("token=xyz"));
        assert_eq!(credentials_from(&headers), Credentials::Bearer("abc".into()));
    }

    #[test]
    fn cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=xyz; lang=en"));
        assert_eq!(credentials_from(&headers), Credentials::Cookie("xyz".into()));
    }

    #[test]
    fn nothing_presented() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        headers.insert(COOKIE, HeaderValue::from_static("token="));
        assert_eq!(credentials_from(&headers), Credentials::Anonymous);
    }

    #[test]
    fn cookie_attributes() {
        let policy = CookiePolicy {
            max_age_secs: 60,
            secure: true,
        };
        let cookie = session_cookie("t0k", policy);
        assert!(cookie.starts_with("token=t0k;"));
        assert!(cookie.contains("Max-Age=60"));
        assert!(cookie.ends_with("; Secure"));
        assert!(cleared_cookie().contains("Max-Age=0"));
    }
}

//! Session cookie handling and the login guard
//!
//! The cookie carries the raw session token; the database stores only its
//! digest (see `nbc_common::auth`).

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Duration;
use nbc_common::auth;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "nbc_session";

/// Where a successful login lands when no `next` was given
pub const DEFAULT_LANDING: &str = "/records";

/// Authenticated username, inserted into request extensions by [`require_session`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Extract the session token from the `Cookie` header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// Resolve the logged-in user, if any
///
/// Store errors are logged and treated as "not logged in".
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let token = session_token(headers)?;
    match auth::session_user(&state.db, &token).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Session lookup failed: {}", e);
            None
        }
    }
}

/// `Set-Cookie` value for a new session
pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds().max(0)
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Accept only local absolute paths as post-login targets
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => DEFAULT_LANDING,
    }
}

/// Percent-encode a value for use in a query string
pub fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Login guard for protected routes
///
/// HTML requests without a session are redirected to `/login?next=<path>`;
/// `/api/` requests get a 401 JSON error.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user) = current_user(&state, request.headers()).await {
        request.extensions_mut().insert(CurrentUser(user));
        return next.run(request).await;
    }

    let path = request.uri().path();
    debug!("Unauthenticated request for {}", path);

    if path.starts_with("/api/") {
        return ApiError::Unauthorized("Login required".to_string()).into_response();
    }

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(DEFAULT_LANDING);
    Redirect::to(&format!("/login?next={}", encode_query_value(target))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; nbc_session=abc123; lang=am"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("nbc_session="));
        assert_eq!(session_token(&empty), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/farmers")), "/farmers");
        assert_eq!(safe_next(Some("//evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("https://evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(None), DEFAULT_LANDING);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("tok", Duration::hours(12));
        assert!(cookie.starts_with("nbc_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=43200"));
    }

    #[test]
    fn test_encode_query_value() {
        assert_eq!(encode_query_value("/records?x=1&y=2"), "/records%3Fx%3D1%26y%3D2");
    }
}

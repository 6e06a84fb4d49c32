// Request authentication: session extraction from bearer header or cookie
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::Duration;

use crate::auth::session::{session_from_token, Session};
use crate::{AppError, AppState};

pub const SESSION_COOKIE: &str = "lithub.session-token";
pub const OAUTH_STATE_COOKIE: &str = "lithub.oauth-state";

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Bearer header first, then the session cookie
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer.or_else(|| cookie_value(headers, SESSION_COOKIE))
}

pub fn set_cookie(name: &str, value: &str, max_age: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        value,
        max_age.num_seconds().max(0)
    )
}

pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}

fn session_from_headers(headers: &HeaderMap, state: &AppState) -> Result<Session, AppError> {
    let token = session_token_from_headers(headers)
        .ok_or_else(|| AppError::AuthError("Unauthorized".to_string()))?;
    let claims = state.auth_service.verify_token(token)?;
    let expires = claims.expires_at();
    session_from_token(&claims.token, expires)
        .ok_or_else(|| AppError::AuthError("Session is missing a user id".to_string()))
}

/// Signed-in user; rejects the request with 401 otherwise
pub struct AuthSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_from_headers(&parts.headers, state).map(AuthSession)
    }
}

/// Signed-in user if any; a bad or missing token reads as signed out
pub struct MaybeSession(pub Option<Session>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(session_from_headers(&parts.headers, state).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("lithub.session-token=from-cookie"));
        assert_eq!(session_token_from_headers(&headers), Some("from-header"));
    }

    #[test]
    fn test_cookie_lookup_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; lithub.session-token=abc.def.ghi; other=1"),
        );
        assert_eq!(session_token_from_headers(&headers), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_no_credentials() {
        assert_eq!(session_token_from_headers(&HeaderMap::new()), None);
    }
}

//! Cookie session gate.
//!
//! A request is authenticated iff it carries a `session` cookie whose value is
//! exactly `authenticated`. Nothing is stored server side.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{
        header::COOKIE,
        request::Parts,
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use tracing::debug;

pub const SESSION_COOKIE_NAME: &str = "session";
pub const SESSION_AUTHENTICATED: &str = "authenticated";

const SET_SESSION_COOKIE: &str =
    "session=authenticated; Path=/; Max-Age=86400; HttpOnly; Secure; SameSite=Strict";
const CLEAR_SESSION_COOKIE: &str = "session=; Path=/; Max-Age=-1; HttpOnly; Secure; SameSite=Strict";

/// Authentication state of a request, resolved from its cookies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Session {
    Authenticated,
    Anonymous,
}

impl Session {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if is_authenticated(headers) {
            Self::Authenticated
        } else {
            Self::Anonymous
        }
    }

    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[must_use]
pub fn is_authenticated(headers: &HeaderMap) -> bool {
    extract_session_value(headers).is_some_and(|value| value == SESSION_AUTHENTICATED)
}

/// Router guard: anonymous requests are redirected to the landing page.
pub async fn require_session(request: Request, next: Next) -> Response {
    if is_authenticated(request.headers()) {
        next.run(request).await
    } else {
        debug!(path = %request.uri().path(), "no valid session, redirecting");
        Redirect::to("/").into_response()
    }
}

/// `Set-Cookie` value issued after a successful login.
#[must_use]
pub fn session_cookie() -> HeaderValue {
    HeaderValue::from_static(SET_SESSION_COOKIE)
}

/// `Set-Cookie` value that makes the browser drop the session.
#[must_use]
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(CLEAR_SESSION_COOKIE)
}

// First `session` cookie wins, across every Cookie header on the request.
fn extract_session_value(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let Some(key) = parts.next() else {
                continue;
            };
            if key.trim() == SESSION_COOKIE_NAME {
                let val = parts.next().unwrap_or_default().trim();
                return Some(val.trim_matches('"').to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            if let Ok(value) = HeaderValue::from_str(cookie) {
                headers.append(COOKIE, value);
            }
        }
        headers
    }

    #[test]
    fn test_authenticated_cookie() {
        assert!(is_authenticated(&headers_with(&["session=authenticated"])));
        assert!(is_authenticated(&headers_with(&[
            "theme=dark; session=authenticated; lang=en"
        ])));
        assert!(is_authenticated(&headers_with(&[
            "theme=dark",
            "session=authenticated"
        ])));
    }

    #[test]
    fn test_missing_or_wrong_cookie() {
        assert!(!is_authenticated(&HeaderMap::new()));
        assert!(!is_authenticated(&headers_with(&["session="])));
        assert!(!is_authenticated(&headers_with(&["session=Authenticated"])));
        assert!(!is_authenticated(&headers_with(&["session=admin"])));
        assert!(!is_authenticated(&headers_with(&["sessionx=authenticated"])));
        assert!(!is_authenticated(&headers_with(&["other=authenticated"])));
    }

    #[test]
    fn test_first_session_cookie_wins() {
        assert!(!is_authenticated(&headers_with(&[
            "session=nope; session=authenticated"
        ])));
        assert!(is_authenticated(&headers_with(&[
            "session=authenticated; session=nope"
        ])));
    }

    #[test]
    fn test_session_from_headers() {
        assert_eq!(
            Session::from_headers(&headers_with(&["session=authenticated"])),
            Session::Authenticated
        );
        assert_eq!(Session::from_headers(&HeaderMap::new()), Session::Anonymous);
        assert!(!Session::Anonymous.is_authenticated());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie();
        let cookie = cookie.to_str().unwrap_or_default();
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE_NAME}={SESSION_AUTHENTICATED};")));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
    }

    #[test]
    fn test_clear_session_cookie_attributes() {
        let cookie = clear_session_cookie();
        let cookie = cookie.to_str().unwrap_or_default();
        assert!(cookie.starts_with("session=;"));
        assert!(cookie.contains("Max-Age=-1"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
    }
}

// Request authentication for the game API
//
// Two ways in, tried in order:
// - HTTP Basic whose user name is an email address. The password is not
//   checked; unknown players are registered on the spot. A successful Basic
//   login answers with a session cookie.
// - The `sessionid` cookie handed out by an earlier Basic login.

use std::sync::LazyLock;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as base64_engine;
use regex::Regex;

use crate::ms_api::AppState;
use crate::ms_error::ApiError;

pub const SESSION_COOKIE: &str = "sessionid";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("static email pattern")
});

/// The authenticated player, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player(pub String);

pub fn is_valid_email(value: &str) -> bool {
    value.len() <= 254 && EMAIL_RE.is_match(value)
}

/// Decodes a `Basic` credential into the user name part.
/// `None` when the value is not base64 or has no `user:password` shape.
fn basic_user(encoded: &str) -> Option<String> {
    let decoded = base64_engine.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, _password) = text.split_once(':')?;
    Some(user.to_string())
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

fn session_cookie(id: &str, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE}={id}; HttpOnly; Path=/; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// Middleware guarding the game routes.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let basic = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .map(basic_user);

    if let Some(user) = basic {
        let Some(email) = user.filter(|u| is_valid_email(u)) else {
            log::debug!("rejected Basic credentials");
            return ApiError::InvalidCredentials.into_response();
        };
        let player = state.store.get_or_create_user(&email).await;

        // Keep an existing session of the same player instead of piling up new ones
        let mut existing = None;
        if let Some(id) = session_id(req.headers()) {
            if state.store.session_player(id).await.as_deref() == Some(player.as_str()) {
                existing = Some(id.to_string());
            }
        }

        req.extensions_mut().insert(Player(player.clone()));
        let mut resp = next.run(req).await;
        if existing.is_none() {
            let id = state.store.open_session(&player).await;
            if let Some(cookie) = session_cookie(&id, state.secure_cookies) {
                resp.headers_mut().append(header::SET_COOKIE, cookie);
            }
        }
        return resp;
    }

    let from_session = match session_id(req.headers()) {
        Some(id) => state.store.session_player(id).await,
        None => None,
    };
    match from_session {
        Some(player) => {
            req.extensions_mut().insert(Player(player));
            next.run(req).await
        }
        None => ApiError::NotAuthenticated.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn decodes_basic_user() {
        let encoded = base64_engine.encode("Ann@Example.com:");
        assert_eq!(basic_user(&encoded).as_deref(), Some("Ann@Example.com"));
        let encoded = base64_engine.encode("ann@example.com:secret:with:colons");
        assert_eq!(basic_user(&encoded).as_deref(), Some("ann@example.com"));
        assert_eq!(basic_user(&base64_engine.encode("no-colon")), None);
        assert_eq!(basic_user("%%%"), None);
    }

    #[test]
    fn finds_session_among_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sessionid=abc123; lang=en"),
        );
        assert_eq!(session_id(&headers), Some("abc123"));
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn secure_flag_follows_setting() {
        let plain = session_cookie("x", false).unwrap();
        assert_eq!(plain.to_str().unwrap(), "sessionid=x; HttpOnly; Path=/; SameSite=Lax");
        let secure = session_cookie("x", true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }
}

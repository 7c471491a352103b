//! Signed-cookie sessions and flash messages
//!
//! The session is a single authenticated flag: the cookie carries a fixed
//! payload plus a keyed-hash tag, so possession of a valid tag is the
//! login. Tampered, truncated, or foreign cookies all read as logged-out.
//! Flash messages ride a separate short-lived cookie, cleared on the page
//! render that displays them.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use base64::Engine;

use crate::http::server::AppState;

const SESSION_COOKIE: &str = "quill_session";
const FLASH_COOKIE: &str = "quill_flash";
const SESSION_PAYLOAD: &[u8] = b"logged-in";
// The operator stays signed in until explicit logout.
const SESSION_MAX_AGE: u32 = 60 * 60 * 24 * 365;

/// Session signing key, derived from the configured secret.
#[derive(Clone)]
pub struct SessionKey([u8; 32]);

impl SessionKey {
    pub fn derive(secret: &str) -> Self {
        Self(blake3::derive_key(
            "quill 2024 session cookie",
            secret.as_bytes(),
        ))
    }

    fn tag(&self, payload: &[u8]) -> blake3::Hash {
        blake3::keyed_hash(&self.0, payload)
    }

    /// Produce a signed session cookie value.
    pub fn sign(&self) -> String {
        format!(
            "{}.{}",
            B64.encode(SESSION_PAYLOAD),
            B64.encode(self.tag(SESSION_PAYLOAD).as_bytes())
        )
    }

    /// Check a cookie value; the tag comparison is constant-time.
    pub fn verify(&self, value: &str) -> bool {
        let Some((payload_b64, tag_b64)) = value.split_once('.') else {
            return false;
        };
        let Ok(payload) = B64.decode(payload_b64) else {
            return false;
        };
        let Ok(tag) = B64.decode(tag_b64) else {
            return false;
        };
        let Ok(tag) = <[u8; 32]>::try_from(tag) else {
            return false;
        };
        self.tag(&payload) == blake3::Hash::from_bytes(tag) && payload == SESSION_PAYLOAD
    }
}

/// Compare the configured password against form input in constant time.
pub fn password_matches(expected: &str, provided: &str) -> bool {
    // Hashing both sides gives fixed-length, constant-time comparison.
    blake3::hash(expected.as_bytes()) == blake3::hash(provided.as_bytes())
}

/// Per-request authentication state.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub logged_in: bool,
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let logged_in = cookie_value(&parts.headers, SESSION_COOKIE)
            .map(|v| state.session_key.verify(&v))
            .unwrap_or(false);
        Ok(Session { logged_in })
    }
}

/// Flash severity, mapped to a css class by the page renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Danger,
}

impl FlashLevel {
    pub fn css_class(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Danger => "danger",
        }
    }

    fn as_str(self) -> &'static str {
        self.css_class()
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(FlashLevel::Success),
            "danger" => Some(FlashLevel::Danger),
            _ => None,
        }
    }
}

/// One user-facing message surviving a redirect.
#[derive(Debug, Clone)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Danger,
            message: message.into(),
        }
    }
}

/// Extractor for a pending flash message, if any.
///
/// Reading does not clear the cookie; the handler that renders the message
/// appends [`clear_flash_cookie`] to its response.
#[derive(Debug, Clone)]
pub struct Flash(pub Option<FlashMessage>);

impl FromRequestParts<Arc<AppState>> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let message = cookie_value(&parts.headers, FLASH_COOKIE)
            .and_then(|v| B64.decode(v).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|decoded| {
                let (level, message) = decoded.split_once(':')?;
                Some(FlashMessage {
                    level: FlashLevel::parse(level)?,
                    message: message.to_string(),
                })
            });
        Ok(Flash(message))
    }
}

/// Set-Cookie value establishing a logged-in session.
pub fn session_cookie(key: &SessionKey) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        key.sign(),
        SESSION_MAX_AGE
    )
}

/// Set-Cookie value clearing the session.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Set-Cookie value carrying a flash message to the next page render.
pub fn flash_cookie(level: FlashLevel, message: &str) -> String {
    let value = B64.encode(format!("{}:{}", level.as_str(), message));
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        FLASH_COOKIE, value
    )
}

/// Set-Cookie value clearing a consumed flash message.
pub fn clear_flash_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", FLASH_COOKIE)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(header) = header.to_str() else {
            continue;
        };
        for pair in header.split(';') {
            if let Some((k, v)) = pair.trim().split_once('=') {
                if k == name {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn sign_verify_roundtrip() {
        let key = SessionKey::derive("a secret");
        assert!(key.verify(&key.sign()));
    }

    #[test]
    fn tampered_cookie_is_rejected() {
        let key = SessionKey::derive("a secret");
        let mut value = key.sign();
        value.pop();
        value.push('A');
        assert!(!key.verify(&value));
        assert!(!key.verify("not-even-a-cookie"));
        assert!(!key.verify(""));
    }

    #[test]
    fn foreign_key_is_rejected() {
        let signed = SessionKey::derive("a secret").sign();
        assert!(!SessionKey::derive("another secret").verify(&signed));
    }

    #[test]
    fn password_check() {
        assert!(password_matches("hunter2", "hunter2"));
        assert!(!password_matches("hunter2", "hunter"));
        assert!(!password_matches("hunter2", ""));
    }

    #[test]
    fn cookie_header_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("a=1; quill_session=xyz; b=2"),
        );
        assert_eq!(
            cookie_value(&headers, "quill_session").as_deref(),
            Some("xyz")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn flash_cookie_roundtrip() {
        let set = flash_cookie(FlashLevel::Success, "Entry saved successfully.");
        let value = set
            .strip_prefix("quill_flash=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        let decoded = String::from_utf8(B64.decode(value).unwrap()).unwrap();
        assert_eq!(decoded, "success:Entry saved successfully.");
    }
}

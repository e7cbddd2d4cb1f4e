//! Cookie-backed login sessions.
//!
//! The session is a single signed cookie holding the username. Anything that
//! fails signature verification reads as "not logged in".

use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};

pub const SESSION_COOKIE: &str = "session";

/// Derive the cookie signing key from the application secret.
pub fn derive_key(secret: &[u8]) -> Key {
    let digest = Sha512::digest(secret);
    Key::from(digest.as_slice())
}

/// Attach a session for `username` to the jar.
pub fn start(jar: SignedCookieJar, username: &str) -> SignedCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, username.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

pub fn end(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub fn current_user(jar: &SignedCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};
    use axum::response::IntoResponse;

    fn key() -> Key {
        derive_key(b"test-secret")
    }

    /// Feed the Set-Cookie output of one jar back as the Cookie header of the next request.
    fn roundtrip(jar: SignedCookieJar, key: Key) -> SignedCookieJar {
        let response = jar.into_response();
        let pairs: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::to_string)
            .collect();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&pairs.join("; ")).unwrap(),
        );
        SignedCookieJar::from_headers(&headers, key)
    }

    #[test]
    fn test_start_then_read_back() {
        let jar = start(SignedCookieJar::new(key()), "alice");
        let jar = roundtrip(jar, key());
        assert_eq!(current_user(&jar), Some("alice".to_string()));
    }

    #[test]
    fn test_empty_jar_has_no_user() {
        let jar = SignedCookieJar::new(key());
        assert_eq!(current_user(&jar), None);
    }

    #[test]
    fn test_forged_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session=alice"));
        let jar = SignedCookieJar::from_headers(&headers, key());
        assert_eq!(current_user(&jar), None);
    }

    #[test]
    fn test_cookie_signed_with_other_key_is_ignored() {
        let jar = start(SignedCookieJar::new(derive_key(b"other-secret")), "mallory");
        let jar = roundtrip(jar, key());
        assert_eq!(current_user(&jar), None);
    }

    #[test]
    fn test_end_removes_session() {
        let jar = start(SignedCookieJar::new(key()), "alice");
        let jar = end(jar);
        assert_eq!(current_user(&jar), None);
    }
}

//! URL-safe, time-limited, HMAC-signed password-reset tokens.
//!
//! Format: `b64url(username) "." issued_at "." b64url(mac)` where
//! `mac = HMAC-SHA256(secret, SALT "|" payload "|" issued_at "|" fingerprint)`.
//!
//! The fingerprint is the account's current password hash. It is not part of
//! the token, so a link stops verifying once the password has changed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SALT: &str = "password-reset";

/// Tolerated clock skew for tokens that claim to be issued in the future.
const MAX_FUTURE_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
}

#[derive(Clone)]
pub struct ResetTokens {
    secret: Vec<u8>,
    max_age_secs: i64,
}

impl ResetTokens {
    pub fn new(secret: &[u8], max_age_secs: u64) -> Self {
        Self {
            secret: secret.to_vec(),
            max_age_secs: i64::try_from(max_age_secs).unwrap_or(i64::MAX),
        }
    }

    /// Issue a token for `username` stamped with `now` (unix seconds) and
    /// bound to `fingerprint`.
    pub fn issue(&self, username: &str, fingerprint: &str, now: i64) -> String {
        self.issue_salted(SALT, username, fingerprint, now)
    }

    /// The username a token claims, without checking the signature. Used to
    /// look up the fingerprint before calling [`ResetTokens::verify`].
    pub fn claimed_user(token: &str) -> Result<String, TokenError> {
        let (payload, _, _) = split(token)?;
        decode_username(payload)
    }

    /// Return the username the token was issued for.
    pub fn verify(&self, token: &str, fingerprint: &str, now: i64) -> Result<String, TokenError> {
        self.verify_salted(SALT, token, fingerprint, now)
    }

    fn issue_salted(&self, salt: &str, username: &str, fingerprint: &str, now: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(username.as_bytes());
        let issued_at = now.to_string();
        let mac = self
            .mac(salt, &payload, &issued_at, fingerprint)
            .finalize()
            .into_bytes();
        format!("{payload}.{issued_at}.{}", URL_SAFE_NO_PAD.encode(mac))
    }

    fn verify_salted(
        &self,
        salt: &str,
        token: &str,
        fingerprint: &str,
        now: i64,
    ) -> Result<String, TokenError> {
        let (payload, issued_at, signature) = split(token)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        self.mac(salt, payload, issued_at, fingerprint)
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let issued: i64 = issued_at.parse().map_err(|_| TokenError::Malformed)?;
        if issued - now > MAX_FUTURE_SKEW_SECS {
            return Err(TokenError::Malformed);
        }
        if now.saturating_sub(issued) > self.max_age_secs {
            return Err(TokenError::Expired);
        }

        decode_username(payload)
    }

    fn mac(&self, salt: &str, payload: &str, issued_at: &str, fingerprint: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(salt.as_bytes());
        mac.update(b"|");
        mac.update(payload.as_bytes());
        mac.update(b"|");
        mac.update(issued_at.as_bytes());
        mac.update(b"|");
        mac.update(fingerprint.as_bytes());
        mac
    }
}

fn split(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(payload), Some(issued_at), Some(signature), None) => {
            Ok((payload, issued_at, signature))
        }
        _ => Err(TokenError::Malformed),
    }
}

fn decode_username(payload: &str) -> Result<String, TokenError> {
    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    String::from_utf8(raw).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;
    const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA";

    fn tokens() -> ResetTokens {
        ResetTokens::new(b"test-secret", 3600)
    }

    #[test]
    fn test_issue_then_verify() {
        let t = tokens();
        let token = t.issue("alice@example.com", HASH, NOW);
        assert_eq!(
            ResetTokens::claimed_user(&token).unwrap(),
            "alice@example.com"
        );
        assert_eq!(t.verify(&token, HASH, NOW + 10).unwrap(), "alice@example.com");
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = tokens().issue("weird+name/with?chars@example.com", HASH, NOW);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn test_token_dies_with_password_change() {
        let t = tokens();
        let token = t.issue("alice", HASH, NOW);
        let new_hash = "$argon2id$v=19$m=19456,t=2,p=1$b3RoZXI$bmV3";
        assert_eq!(
            t.verify(&token, new_hash, NOW + 10),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let t = tokens();
        let token = t.issue("alice", HASH, NOW);
        assert_eq!(t.verify(&token, HASH, NOW + 3600).unwrap(), "alice");
        assert_eq!(t.verify(&token, HASH, NOW + 3601), Err(TokenError::Expired));
    }

    #[test]
    fn test_future_token_rejected() {
        let t = tokens();
        let token = t.issue("alice", HASH, NOW + 3600);
        assert_eq!(t.verify(&token, HASH, NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let t = tokens();
        let token = t.issue("alice", HASH, NOW);
        let forged_payload = URL_SAFE_NO_PAD.encode("mallory");
        let rest = token.split_once('.').unwrap().1;
        let forged = format!("{forged_payload}.{rest}");
        assert_eq!(ResetTokens::claimed_user(&forged).unwrap(), "mallory");
        assert_eq!(t.verify(&forged, HASH, NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_extended_timestamp_rejected() {
        let t = tokens();
        let token = t.issue("alice", HASH, NOW);
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], NOW + 7200, parts[2]);
        assert_eq!(
            t.verify(&forged, HASH, NOW + 5000),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = ResetTokens::new(b"other-secret", 3600).issue("alice", HASH, NOW);
        assert_eq!(tokens().verify(&token, HASH, NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_other_salt_rejected() {
        let t = tokens();
        let token = t.issue_salted("reset-salt", "alice", HASH, NOW);
        assert_eq!(t.verify(&token, HASH, NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let t = tokens();
        assert_eq!(t.verify("", HASH, NOW), Err(TokenError::Malformed));
        assert_eq!(t.verify("abc", HASH, NOW), Err(TokenError::Malformed));
        assert_eq!(t.verify("a.b.c.d", HASH, NOW), Err(TokenError::Malformed));
        assert_eq!(t.verify("a.b.!!!", HASH, NOW), Err(TokenError::Malformed));
        assert_eq!(ResetTokens::claimed_user("!!!.1.sig"), Err(TokenError::Malformed));
    }
}

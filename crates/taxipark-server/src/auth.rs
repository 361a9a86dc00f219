use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use taxipark_model::{Driver, DriverId};
use taxipark_store::{drivers, Store};
use tracing::warn;

use crate::config::ServerConfig;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "taxipark_session";

#[derive(Debug)]
pub struct AuthError(pub String);

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for AuthError {}

#[must_use]
pub fn random_secret() -> Vec<u8> {
    let mut secret = vec![0_u8; 32];
    OsRng.fill_bytes(&mut secret);
    secret
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError(e.to_string()))
}

#[must_use]
pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct SessionPayload {
    driver_id: i64,
    issued_at: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Session token: URL-safe base64 JSON payload, a dot, then the HMAC-SHA256
/// signature of the payload part.
pub fn issue_session(secret: &[u8], driver_id: DriverId) -> Result<String, AuthError> {
    let payload = SessionPayload {
        driver_id: driver_id.0,
        issued_at: unix_now(),
    };
    let payload_bytes = serde_json::to_vec(&payload).map_err(|e| AuthError(e.to_string()))?;
    let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|e| AuthError(e.to_string()))?;
    mac.update(payload_part.as_bytes());
    let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{payload_part}.{sig_part}"))
}

/// Verify signature and expiry; any failure means Anonymous.
#[must_use]
pub fn verify_session(secret: &[u8], token: &str, ttl: Duration) -> Option<DriverId> {
    let (payload_part, sig_part) = token.split_once('.')?;
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload_part.as_bytes());
    let expected = URL_SAFE_NO_PAD.decode(sig_part).ok()?;
    mac.verify_slice(&expected).ok()?;

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload_part).ok()?;
    let payload: SessionPayload = serde_json::from_slice(&payload_bytes).ok()?;
    if unix_now().saturating_sub(payload.issued_at) > ttl.as_secs() {
        return None;
    }
    Some(DriverId(payload.driver_id))
}

#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get("cookie")?.to_str().ok()?;
    raw.split(';')
        .filter_map(|piece| piece.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

#[must_use]
pub fn session_set_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

#[must_use]
pub fn session_clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Resolve the request to its principal: a valid, unexpired session cookie
/// naming an existing driver. Anything else is Anonymous (`None`).
pub async fn authenticated_driver(
    store: &Store,
    config: &ServerConfig,
    headers: &HeaderMap,
) -> Option<Driver> {
    let token = cookie_value(headers, SESSION_COOKIE)?;
    let driver_id = verify_session(&config.session_secret, &token, config.session_ttl)?;
    let db = match store.acquire().await {
        Ok(v) => v,
        Err(e) => {
            warn!("session lookup failed to acquire connection: {e}");
            return None;
        }
    };
    drivers::get(&db.conn, driver_id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_sessions_verify_and_resolve_the_driver() {
        let secret = b"test-secret";
        let token = issue_session(secret, DriverId(7)).expect("issue");
        assert_eq!(
            verify_session(secret, &token, Duration::from_secs(60)),
            Some(DriverId(7))
        );
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let token = issue_session(b"secret-a", DriverId(7)).expect("issue");
        assert_eq!(
            verify_session(b"secret-b", &token, Duration::from_secs(60)),
            None
        );
        let mut forged = token.clone();
        forged.push('x');
        assert_eq!(
            verify_session(b"secret-a", &forged, Duration::from_secs(60)),
            None
        );
        assert_eq!(
            verify_session(b"secret-a", "not-a-token", Duration::from_secs(60)),
            None
        );
    }

    #[test]
    fn expired_sessions_are_anonymous() {
        let secret = b"test-secret";
        let token = issue_session(secret, DriverId(7)).expect("issue");
        assert_eq!(verify_session(secret, &token, Duration::from_secs(0)), None);
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("pass12345").expect("hash");
        assert!(verify_password(&hash, "pass12345"));
        assert!(!verify_password(&hash, "wrong-pass"));
        assert!(!verify_password("not-a-hash", "pass12345"));
    }

    #[test]
    fn cookie_parsing_picks_the_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            "other=1; taxipark_session=abc.def; tail=2".parse().expect("header"),
        );
        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE),
            Some("abc.def".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}

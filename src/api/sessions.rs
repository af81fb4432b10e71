//! Host login sessions.
//!
//! The host's own authenticated session, distinct from the MFA window
//! cookie. The browser holds a random token; only its hash touches the
//! store.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::gate::{error::GateError, kv::KeyValueStore};

pub const LOGIN_COOKIE_NAME: &str = "hydrogate_login";
const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

fn session_key(token_hash: &str) -> String {
    format!("session:{token_hash}")
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct HostSessions<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> HostSessions<'a> {
    #[must_use]
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Create a session and return the raw token for the cookie.
    ///
    /// # Errors
    /// Returns an error when token generation or the store write fails.
    pub fn create(&self, user_id: u64) -> Result<String, GateError> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| GateError::Secret(format!("failed to generate session token: {err}")))?;
        let token = URL_SAFE_NO_PAD.encode(bytes);
        self.store.set(
            &session_key(&hash_token(&token)),
            &user_id.to_string(),
            Some(SESSION_TTL),
        )?;
        Ok(token)
    }

    /// # Errors
    /// Returns an error when the store read fails.
    pub fn lookup(&self, token: &str) -> Result<Option<u64>, GateError> {
        let Some(raw) = self.store.get(&session_key(&hash_token(token)))? else {
            return Ok(None);
        };
        Ok(raw.trim().parse::<u64>().ok())
    }

    /// # Errors
    /// Returns an error when the store delete fails.
    pub fn delete(&self, token: &str) -> Result<(), GateError> {
        self.store.delete(&session_key(&hash_token(token)))
    }
}

/// `Set-Cookie` value installing the login cookie.
#[must_use]
pub fn set_cookie(token: &str, secure: bool) -> String {
    let max_age = SESSION_TTL.as_secs();
    let mut cookie =
        format!("{LOGIN_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value expiring the login cookie.
#[must_use]
pub fn clear_cookie(secure: bool) -> String {
    let mut cookie = format!("{LOGIN_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

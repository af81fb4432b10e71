//! Signed MFA session cookie.
//!
//! The cookie marks "primary login passed, MFA pending" independently of
//! the host's own session. Wire format, kept exact for interoperability
//! with previously issued cookies:
//!
//! `base64(tag|obfuscated_user_id|identity|expires_at_unix)` + `"|"` +
//! `hex(HMAC-SHA1(encoded_value, secret))`
//!
//! The user id is masked with a keystream derived from the signing secret
//! so raw numeric ids never appear in the cookie. The mask is reversible
//! and not a security boundary; the MAC is.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretBox};
use sha1::Sha1;

use crate::gate::{error::GateError, kv::KeyValueStore};

type HmacSha1 = Hmac<Sha1>;

pub const COOKIE_NAME: &str = "hydrogate_mfa";
pub const COOKIE_TTL_SECONDS: i64 = 24 * 60 * 60;

const COOKIE_TAG: &str = "HydroMfa";
const MASK_LABEL: &[u8] = b"hydrogate-uid-mask";
const NONCE_LABEL: &[u8] = b"hydrogate-nonce";
const SECRET_KEY: &str = "mfa:signing-secret";
const SECRET_LEN: usize = 32;

/// Server-side cookie-signing secret.
///
/// Generated once, persisted without TTL, and treated as immutable for the
/// process lifetime.
pub struct SigningSecret(SecretBox<Vec<u8>>);

impl SigningSecret {
    /// Read the secret from the store, minting and persisting one when
    /// absent.
    ///
    /// # Errors
    /// Returns an error when the store fails or the persisted secret is
    /// unusable.
    pub fn load_or_create(store: &dyn KeyValueStore) -> Result<Self, GateError> {
        if let Some(encoded) = store.get(SECRET_KEY)? {
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|err| GateError::Secret(format!("stored secret is not base64: {err}")))?;
            if bytes.len() != SECRET_LEN {
                return Err(GateError::Secret(format!(
                    "stored secret length is {}, expected {SECRET_LEN}",
                    bytes.len()
                )));
            }
            return Ok(Self::from_bytes(bytes));
        }

        let mut bytes = vec![0u8; SECRET_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| GateError::Secret(format!("failed to generate secret: {err}")))?;
        store.set(SECRET_KEY, &STANDARD.encode(&bytes), None)?;
        Ok(Self::from_bytes(bytes))
    }

    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(SecretBox::new(Box::new(bytes)))
    }

    fn mac(&self) -> HmacSha1 {
        // HMAC accepts keys of any length; this cannot fail.
        HmacSha1::new_from_slice(self.0.expose_secret()).expect("HMAC key")
    }
}

fn keystream(secret: &SigningSecret) -> [u8; 8] {
    let mut mac = secret.mac();
    mac.update(MASK_LABEL);
    let digest = mac.finalize().into_bytes();
    let mut stream = [0u8; 8];
    stream.copy_from_slice(&digest[..8]);
    stream
}

fn obfuscate_user_id(user_id: u64, secret: &SigningSecret) -> String {
    let stream = keystream(secret);
    let mut bytes = user_id.to_le_bytes();
    for (byte, mask) in bytes.iter_mut().zip(stream) {
        *byte ^= mask;
    }
    hex::encode(bytes)
}

fn recover_user_id(masked: &str, secret: &SigningSecret) -> Option<u64> {
    let decoded = hex::decode(masked).ok()?;
    let mut bytes: [u8; 8] = decoded.try_into().ok()?;
    for (byte, mask) in bytes.iter_mut().zip(keystream(secret)) {
        *byte ^= mask;
    }
    Some(u64::from_le_bytes(bytes))
}

/// Build a signed cookie value binding this browser to `user_id` for the
/// MFA window.
#[must_use]
pub fn issue(user_id: u64, hydro_id: &str, secret: &SigningSecret, now: i64) -> String {
    let expires_at = now + COOKIE_TTL_SECONDS;
    let value = format!(
        "{COOKIE_TAG}|{}|{hydro_id}|{expires_at}",
        obfuscate_user_id(user_id, secret)
    );
    let encoded = STANDARD.encode(value.as_bytes());
    let mut mac = secret.mac();
    mac.update(encoded.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("{encoded}|{signature}")
}

/// Validate a raw cookie value and return the bound user id.
///
/// Fails closed: a bad MAC, malformed structure, identity mismatch, or
/// expiry are all indistinguishable from "not authenticated". The tag,
/// recovered user id, and identity checks must all hold.
pub fn validate<F>(raw: &str, secret: &SigningSecret, now: i64, lookup: F) -> Option<u64>
where
    F: Fn(u64) -> Option<String>,
{
    let (encoded, signature) = raw.rsplit_once('|')?;
    let signature = hex::decode(signature).ok()?;

    let mut mac = secret.mac();
    mac.update(encoded.as_bytes());
    mac.verify_slice(&signature).ok()?;

    let value = STANDARD.decode(encoded).ok()?;
    let value = String::from_utf8(value).ok()?;
    let parts: Vec<&str> = value.split('|').collect();
    let [tag, masked, identity, expires_at] = parts.as_slice() else {
        return None;
    };

    if *tag != COOKIE_TAG {
        return None;
    }
    let user_id = recover_user_id(masked, secret)?;
    if lookup(user_id)? != *identity {
        return None;
    }
    let expires_at = expires_at.parse::<i64>().ok()?;
    if expires_at <= now {
        return None;
    }
    Some(user_id)
}

/// Anti-forgery token for MFA form submissions, bound to the user id
/// under the signing secret. Stateless: recomputed on check.
#[must_use]
pub fn nonce(secret: &SigningSecret, user_id: u64) -> String {
    let mut mac = secret.mac();
    mac.update(NONCE_LABEL);
    mac.update(&user_id.to_le_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// `Set-Cookie` value installing the MFA cookie.
#[must_use]
pub fn set_cookie(value: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={COOKIE_TTL_SECONDS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` values expiring the cookie immediately, one per path
/// variant it may have been set under.
#[must_use]
pub fn expirations(site_path: Option<&str>, secure: bool) -> Vec<String> {
    let mut paths = vec!["/"];
    if let Some(path) = site_path {
        if path != "/" {
            paths.push(path);
        }
    }
    paths
        .into_iter()
        .map(|path| {
            let mut cookie =
                format!("{COOKIE_NAME}=; Path={path}; HttpOnly; SameSite=Lax; Max-Age=0");
            if secure {
                cookie.push_str("; Secure");
            }
            cookie
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::kv::MemoryStore;

    fn secret() -> SigningSecret {
        SigningSecret::from_bytes(vec![7u8; SECRET_LEN])
    }

    fn lookup(expected: &str) -> impl Fn(u64) -> Option<String> + '_ {
        move |_| Some(expected.to_string())
    }

    #[test]
    fn issue_then_validate_round_trips() {
        let secret = secret();
        let cookie = issue(42, "hydro42", &secret, 1_000);
        assert_eq!(
            validate(&cookie, &secret, 1_000, lookup("hydro42")),
            Some(42)
        );
    }

    #[test]
    fn empty_identity_is_valid_during_setup() {
        let secret = secret();
        let cookie = issue(42, "", &secret, 1_000);
        assert_eq!(validate(&cookie, &secret, 1_000, lookup("")), Some(42));
    }

    #[test]
    fn any_single_byte_mutation_invalidates() {
        let secret = secret();
        let cookie = issue(42, "hydro42", &secret, 1_000);
        for position in 0..cookie.len() {
            let mut tampered: Vec<u8> = cookie.clone().into_bytes();
            tampered[position] ^= 0x01;
            let Ok(tampered) = String::from_utf8(tampered) else {
                continue;
            };
            if tampered == cookie {
                continue;
            }
            assert_eq!(
                validate(&tampered, &secret, 1_000, lookup("hydro42")),
                None,
                "mutation at byte {position} was accepted"
            );
        }
    }

    #[test]
    fn expired_cookie_is_rejected_with_valid_signature() {
        let secret = secret();
        let cookie = issue(42, "hydro42", &secret, 1_000);
        let expiry = 1_000 + COOKIE_TTL_SECONDS;
        assert_eq!(validate(&cookie, &secret, expiry, lookup("hydro42")), None);
        assert_eq!(
            validate(&cookie, &secret, expiry - 1, lookup("hydro42")),
            Some(42)
        );
    }

    #[test]
    fn identity_mismatch_is_rejected() {
        let secret = secret();
        let cookie = issue(42, "hydro42", &secret, 1_000);
        assert_eq!(validate(&cookie, &secret, 1_000, lookup("other")), None);
        assert_eq!(validate(&cookie, &secret, 1_000, |_| None), None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cookie = issue(42, "hydro42", &secret(), 1_000);
        let other = SigningSecret::from_bytes(vec![9u8; SECRET_LEN]);
        assert_eq!(validate(&cookie, &other, 1_000, lookup("hydro42")), None);
    }

    #[test]
    fn malformed_structures_are_rejected() {
        let secret = secret();
        for raw in ["", "no-delimiter", "value|not-hex", "value|abcd"] {
            assert_eq!(validate(raw, &secret, 1_000, lookup("hydro42")), None);
        }
    }

    #[test]
    fn obfuscation_round_trips_and_hides_the_id() {
        let secret = secret();
        let masked = obfuscate_user_id(42, &secret);
        assert_ne!(masked, "42");
        assert_eq!(recover_user_id(&masked, &secret), Some(42));
    }

    #[test]
    fn nonce_is_stable_per_user_and_distinct_across_users() {
        let secret = secret();
        assert_eq!(nonce(&secret, 1), nonce(&secret, 1));
        assert_ne!(nonce(&secret, 1), nonce(&secret, 2));
    }

    #[test]
    fn signing_secret_is_created_once_and_reused() {
        let store = MemoryStore::new();
        let first = SigningSecret::load_or_create(&store).unwrap();
        let second = SigningSecret::load_or_create(&store).unwrap();
        let cookie = issue(42, "hydro42", &first, 1_000);
        assert_eq!(
            validate(&cookie, &second, 1_000, lookup("hydro42")),
            Some(42)
        );
    }

    #[test]
    fn expirations_cover_root_and_site_paths() {
        let cookies = expirations(Some("/blog"), true);
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].contains("Path=/;"));
        assert!(cookies[1].contains("Path=/blog;"));
        assert!(cookies.iter().all(|cookie| cookie.contains("Max-Age=0")));
        assert!(cookies.iter().all(|cookie| cookie.contains("Secure")));

        assert_eq!(expirations(Some("/"), false).len(), 1);
        assert_eq!(expirations(None, false).len(), 1);
    }
}

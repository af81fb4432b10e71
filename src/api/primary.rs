//! Primary credential verification seam.
//!
//! Primary username/password authentication is a collaborator of the gate,
//! not part of it. The trait is the contract; `StoreUsers` is a small
//! store-backed implementation for deployments without an external
//! directory, and for tests.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::gate::{error::GateError, kv::KeyValueStore};

pub trait PrimaryAuth: Send + Sync {
    /// Check credentials and return the user id on success.
    fn verify_credentials(&self, username: &str, password: &str) -> Option<u64>;

    /// Whether the user carries elevated privileges.
    fn is_admin(&self, user_id: u64) -> bool;
}

#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    id: u64,
    password_hash: String,
    #[serde(default)]
    admin: bool,
}

fn user_key(username: &str) -> String {
    format!("user:{}", username.trim().to_lowercase())
}

fn admin_key(user_id: u64) -> String {
    format!("user-admin:{user_id}")
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Users kept in the key-value store.
pub struct StoreUsers {
    store: Arc<dyn KeyValueStore>,
    next_id: std::sync::atomic::AtomicU64,
}

impl StoreUsers {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            next_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// Create or replace a user record.
    ///
    /// # Errors
    /// Returns an error when the store write fails.
    pub fn provision(
        &self,
        username: &str,
        password: &str,
        admin: bool,
    ) -> Result<u64, GateError> {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let record = UserRecord {
            id,
            password_hash: hash_password(password),
            admin,
        };
        let raw =
            serde_json::to_string(&record).map_err(|err| GateError::Store(err.to_string()))?;
        self.store.set(&user_key(username), &raw, None)?;
        self.store
            .set(&admin_key(id), if admin { "1" } else { "0" }, None)?;
        Ok(id)
    }

    fn load(&self, username: &str) -> Option<UserRecord> {
        let raw = self.store.get(&user_key(username)).ok()??;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(username, "user record is malformed: {err}");
                None
            }
        }
    }
}

impl PrimaryAuth for StoreUsers {
    fn verify_credentials(&self, username: &str, password: &str) -> Option<u64> {
        let record = self.load(username)?;
        if record.password_hash == hash_password(password) {
            Some(record.id)
        } else {
            None
        }
    }

    fn is_admin(&self, user_id: u64) -> bool {
        self.store
            .get(&admin_key(user_id))
            .ok()
            .flatten()
            .is_some_and(|value| value == "1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::kv::MemoryStore;

    #[test]
    fn provisioned_user_authenticates() {
        let users = StoreUsers::new(Arc::new(MemoryStore::new()));
        let id = users.provision("Alice", "s3cret", false).unwrap();

        assert_eq!(users.verify_credentials("alice", "s3cret"), Some(id));
        assert_eq!(users.verify_credentials("alice", "wrong"), None);
        assert_eq!(users.verify_credentials("nobody", "s3cret"), None);
        assert!(!users.is_admin(id));
    }

    #[test]
    fn admin_flag_round_trips() {
        let users = StoreUsers::new(Arc::new(MemoryStore::new()));
        let id = users.provision("root", "s3cret", true).unwrap();
        assert!(users.is_admin(id));
    }
}

//! Per-user challenge storage.
//!
//! At most one live challenge per user; minting a new one overwrites the
//! prior entry. Expiry is the store's TTL, never re-checked here — a read
//! past 90 seconds simply returns absent and a fresh challenge is minted
//! on next access.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::gate::{
    error::GateError,
    identity::IdentityClient,
    kv::KeyValueStore,
};

pub const CHALLENGE_TTL: Duration = Duration::from_secs(90);

#[derive(Debug, Serialize, Deserialize)]
struct ChallengeRecord {
    challenge_id: i64,
    created_at: i64,
}

fn challenge_key(user_id: u64) -> String {
    format!("mfa:challenge:{user_id}")
}

pub struct ChallengeStore<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> ChallengeStore<'a> {
    #[must_use]
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Return the user's live challenge, minting one when absent.
    ///
    /// Re-rendering the verify page within the TTL window returns the same
    /// id, so the companion app shows a stable code.
    ///
    /// # Errors
    /// Returns a store error, or an identity error when a fresh challenge
    /// cannot be minted.
    pub async fn get_or_create<C: IdentityClient>(
        &self,
        client: &C,
        user_id: u64,
        now: i64,
    ) -> Result<i64, GateError> {
        if let Some(challenge_id) = self.current(user_id)? {
            return Ok(challenge_id);
        }

        let challenge_id = client.generate_challenge().await?;
        let record = ChallengeRecord {
            challenge_id,
            created_at: now,
        };
        let raw = serde_json::to_string(&record)
            .map_err(|err| GateError::Store(err.to_string()))?;
        self.store
            .set(&challenge_key(user_id), &raw, Some(CHALLENGE_TTL))?;
        debug!(user_id, challenge_id, "minted MFA challenge");
        Ok(challenge_id)
    }

    /// The live challenge for `user_id`, if any.
    ///
    /// # Errors
    /// Returns an error when the store read fails.
    pub fn current(&self, user_id: u64) -> Result<Option<i64>, GateError> {
        let Some(raw) = self.store.get(&challenge_key(user_id))? else {
            return Ok(None);
        };
        match serde_json::from_str::<ChallengeRecord>(&raw) {
            Ok(record) => Ok(Some(record.challenge_id)),
            Err(err) => {
                // Unreadable entries are dropped; the next access mints anew.
                warn!(user_id, "challenge record is malformed: {err}");
                self.store.delete(&challenge_key(user_id))?;
                Ok(None)
            }
        }
    }

    /// Drop the user's challenge unconditionally; absent is not an error.
    ///
    /// # Errors
    /// Returns an error when the store delete fails.
    pub fn invalidate(&self, user_id: u64) -> Result<(), GateError> {
        self.store.delete(&challenge_key(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::identity::IdentityError;
    use crate::gate::kv::MemoryStore;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct CountingClient {
        next: AtomicI64,
    }

    impl CountingClient {
        fn new() -> Self {
            Self {
                next: AtomicI64::new(100_000),
            }
        }
    }

    impl IdentityClient for CountingClient {
        fn generate_challenge(
            &self,
        ) -> impl std::future::Future<Output = Result<i64, IdentityError>> + Send {
            let id = self.next.fetch_add(1, Ordering::SeqCst);
            async move { Ok(id) }
        }

        fn verify_challenge(
            &self,
            _hydro_id: &str,
            _challenge: i64,
        ) -> impl std::future::Future<Output = Result<(), IdentityError>> + Send {
            async { Ok(()) }
        }

        fn register_identity(
            &self,
            _hydro_id: &str,
        ) -> impl std::future::Future<Output = Result<(), IdentityError>> + Send {
            async { Ok(()) }
        }

        fn unregister_identity(
            &self,
            _hydro_id: &str,
        ) -> impl std::future::Future<Output = Result<(), IdentityError>> + Send {
            async { Ok(()) }
        }
    }

    #[tokio::test]
    async fn challenge_is_reused_within_ttl() {
        let store = MemoryStore::new();
        let challenges = ChallengeStore::new(&store);
        let client = CountingClient::new();

        let first = challenges.get_or_create(&client, 7, 0).await.unwrap();
        let second = challenges.get_or_create(&client, 7, 10).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn expired_challenge_is_replaced() {
        let store = MemoryStore::new();
        let challenges = ChallengeStore::new(&store);
        let client = CountingClient::new();

        let first = challenges.get_or_create(&client, 7, 0).await.unwrap();
        // The store reports an expired entry as absent; simulate it.
        store.delete("mfa:challenge:7").unwrap();
        let second = challenges.get_or_create(&client, 7, 91).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn invalidate_is_idempotent_on_absence() {
        let store = MemoryStore::new();
        let challenges = ChallengeStore::new(&store);
        let client = CountingClient::new();

        challenges.invalidate(7).unwrap();
        challenges.get_or_create(&client, 7, 0).await.unwrap();
        challenges.invalidate(7).unwrap();
        assert_eq!(challenges.current(7).unwrap(), None);
    }

    #[tokio::test]
    async fn users_get_distinct_challenges() {
        let store = MemoryStore::new();
        let challenges = ChallengeStore::new(&store);
        let client = CountingClient::new();

        let first = challenges.get_or_create(&client, 1, 0).await.unwrap();
        let second = challenges.get_or_create(&client, 2, 0).await.unwrap();
        assert_ne!(first, second);
    }
}

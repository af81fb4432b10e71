//! Key-value storage seam for profiles, challenges, and flash messages.
//!
//! Durable entries (profiles, the signing secret) are written without a TTL;
//! ephemeral entries (challenges, flash messages) carry one and become
//! unreadable once it elapses. Expiry is enforced here so callers never
//! re-check it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::gate::error::GateError;

/// Storage contract the gate runs against.
///
/// Implementations provide their own durability and per-key atomicity;
/// the gate layers no locking or retries on top.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, GateError>;
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), GateError>;
    fn delete(&self, key: &str) -> Result<(), GateError>;
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| deadline > now)
    }
}

/// In-memory store with lazy expiry.
///
/// Entries past their TTL are indistinguishable from absent ones; the
/// backlog is swept opportunistically on writes.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, GateError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| GateError::Store("memory store lock poisoned".to_string()))?;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|entry| entry.live(now))
            .map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), GateError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GateError::Store("memory store lock poisoned".to_string()))?;
        let now = Instant::now();
        entries.retain(|_, entry| entry.live(now));
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), GateError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GateError::Store("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

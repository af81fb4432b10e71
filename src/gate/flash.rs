//! One-shot user-facing notices.
//!
//! Messages queue per user in the store with a short TTL and drain on the
//! next page render.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gate::{error::GateError, kv::KeyValueStore};

const FLASH_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

fn flash_key(user_id: u64) -> String {
    format!("mfa:flash:{user_id}")
}

pub struct FlashStore<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> FlashStore<'a> {
    #[must_use]
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Queue a notice for the user's next page render.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub fn push(&self, user_id: u64, level: FlashLevel, message: &str) -> Result<(), GateError> {
        let mut pending = self.peek(user_id)?;
        pending.push(Flash {
            level,
            message: message.to_string(),
        });
        let raw =
            serde_json::to_string(&pending).map_err(|err| GateError::Store(err.to_string()))?;
        self.store.set(&flash_key(user_id), &raw, Some(FLASH_TTL))
    }

    /// Drain all pending notices.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub fn take(&self, user_id: u64) -> Result<Vec<Flash>, GateError> {
        let pending = self.peek(user_id)?;
        if !pending.is_empty() {
            self.store.delete(&flash_key(user_id))?;
        }
        Ok(pending)
    }

    fn peek(&self, user_id: u64) -> Result<Vec<Flash>, GateError> {
        let Some(raw) = self.store.get(&flash_key(user_id))? else {
            return Ok(Vec::new());
        };
        // Malformed queues are dropped rather than wedging page renders.
        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }
}

//! Per-user MFA profile storage.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::gate::{error::GateError, kv::KeyValueStore};

/// MFA attributes attached to a user account.
///
/// Invariant: `mfa_confirmed` implies `mfa_enabled` and a non-empty
/// `hydro_id`. `account_blocked` rejects primary login regardless of the
/// other fields and is only cleared out of band by an operator.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MfaProfile {
    #[serde(default)]
    pub hydro_id: String,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default)]
    pub mfa_confirmed: bool,
    #[serde(default)]
    pub failed_attempts: u32,
    #[serde(default)]
    pub account_blocked: bool,
}

impl MfaProfile {
    /// Clear the four MFA fields; blocking stays untouched.
    pub fn reset_mfa(&mut self) {
        self.hydro_id.clear();
        self.mfa_enabled = false;
        self.mfa_confirmed = false;
        self.failed_attempts = 0;
    }
}

fn profile_key(user_id: u64) -> String {
    format!("mfa:profile:{user_id}")
}

/// Profile reads and writes over the key-value seam.
pub struct ProfileStore<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> ProfileStore<'a> {
    #[must_use]
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Load a user's profile; absent users get the zero profile.
    ///
    /// # Errors
    /// Returns an error when the store read fails or the record is
    /// unparseable.
    pub fn load(&self, user_id: u64) -> Result<MfaProfile, GateError> {
        let Some(raw) = self.store.get(&profile_key(user_id))? else {
            return Ok(MfaProfile::default());
        };
        serde_json::from_str(&raw).map_err(|err| {
            warn!(user_id, "MFA profile record is malformed: {err}");
            GateError::Profile(err.to_string())
        })
    }

    /// # Errors
    /// Returns an error when the store write fails.
    pub fn save(&self, user_id: u64, profile: &MfaProfile) -> Result<(), GateError> {
        let raw = serde_json::to_string(profile)
            .map_err(|err| GateError::Profile(err.to_string()))?;
        self.store.set(&profile_key(user_id), &raw, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::kv::MemoryStore;

    #[test]
    fn absent_user_loads_zero_profile() {
        let store = MemoryStore::new();
        let profiles = ProfileStore::new(&store);
        assert_eq!(profiles.load(7).unwrap(), MfaProfile::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::new();
        let profiles = ProfileStore::new(&store);
        let profile = MfaProfile {
            hydro_id: "hydro42".to_string(),
            mfa_enabled: true,
            mfa_confirmed: false,
            failed_attempts: 2,
            account_blocked: false,
        };
        profiles.save(7, &profile).unwrap();
        assert_eq!(profiles.load(7).unwrap(), profile);
    }

    #[test]
    fn reset_clears_mfa_fields_but_not_blocking() {
        let mut profile = MfaProfile {
            hydro_id: "hydro42".to_string(),
            mfa_enabled: true,
            mfa_confirmed: true,
            failed_attempts: 2,
            account_blocked: true,
        };
        profile.reset_mfa();
        assert!(profile.hydro_id.is_empty());
        assert!(!profile.mfa_enabled);
        assert!(!profile.mfa_confirmed);
        assert_eq!(profile.failed_attempts, 0);
        assert!(profile.account_blocked);
    }

    #[test]
    fn malformed_record_is_an_error() {
        let store = MemoryStore::new();
        store.set("mfa:profile:7", "not-json", None).unwrap();
        let profiles = ProfileStore::new(&store);
        assert!(matches!(profiles.load(7), Err(GateError::Profile(_))));
    }
}

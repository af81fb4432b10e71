//! Failed-attempt counting and account lockout.

use tracing::warn;

use crate::gate::{error::GateError, kv::KeyValueStore, profile::ProfileStore};

/// Outcome of recording a failed verification attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FailureRecord {
    pub failed_attempts: u32,
    /// True only on the call that tripped the lockout.
    pub blocked_now: bool,
}

pub struct AttemptPolicy<'a> {
    profiles: ProfileStore<'a>,
    max_attempts: u32,
}

impl<'a> AttemptPolicy<'a> {
    /// `max_attempts == 0` disables lockout entirely.
    #[must_use]
    pub fn new(store: &'a dyn KeyValueStore, max_attempts: u32) -> Self {
        Self {
            profiles: ProfileStore::new(store),
            max_attempts,
        }
    }

    /// Record one failed verification attempt.
    ///
    /// Once the count exceeds the maximum the account is blocked and the
    /// counter resets; blocking is sticky until an operator clears it.
    ///
    /// # Errors
    /// Returns an error when the profile cannot be read or written.
    pub fn record_failure(&self, user_id: u64) -> Result<FailureRecord, GateError> {
        let mut profile = self.profiles.load(user_id)?;
        profile.failed_attempts = profile.failed_attempts.saturating_add(1);

        let blocked_now = self.max_attempts > 0 && profile.failed_attempts > self.max_attempts;
        if blocked_now {
            warn!(
                user_id,
                failed_attempts = profile.failed_attempts,
                "failed-attempt limit exceeded, blocking account"
            );
            profile.account_blocked = true;
            profile.failed_attempts = 0;
        }

        let failed_attempts = profile.failed_attempts;
        self.profiles.save(user_id, &profile)?;
        Ok(FailureRecord {
            failed_attempts,
            blocked_now,
        })
    }

    /// Reset the counter after a successful verification. Does not clear
    /// an existing block.
    ///
    /// # Errors
    /// Returns an error when the profile cannot be read or written.
    pub fn record_success(&self, user_id: u64) -> Result<(), GateError> {
        let mut profile = self.profiles.load(user_id)?;
        profile.failed_attempts = 0;
        self.profiles.save(user_id, &profile)
    }

    /// # Errors
    /// Returns an error when the profile cannot be read.
    pub fn is_blocked(&self, user_id: u64) -> Result<bool, GateError> {
        Ok(self.profiles.load(user_id)?.account_blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::kv::MemoryStore;

    #[test]
    fn blocks_only_past_the_maximum() {
        let store = MemoryStore::new();
        let policy = AttemptPolicy::new(&store, 3);

        for attempt in 1..=3 {
            let record = policy.record_failure(7).unwrap();
            assert_eq!(record.failed_attempts, attempt);
            assert!(!record.blocked_now);
        }
        assert!(!policy.is_blocked(7).unwrap());

        let record = policy.record_failure(7).unwrap();
        assert!(record.blocked_now);
        assert_eq!(record.failed_attempts, 0);
        assert!(policy.is_blocked(7).unwrap());
    }

    #[test]
    fn zero_maximum_never_blocks() {
        let store = MemoryStore::new();
        let policy = AttemptPolicy::new(&store, 0);

        for _ in 0..50 {
            assert!(!policy.record_failure(7).unwrap().blocked_now);
        }
        assert!(!policy.is_blocked(7).unwrap());
    }

    #[test]
    fn success_resets_counter_but_not_block() {
        let store = MemoryStore::new();
        let policy = AttemptPolicy::new(&store, 2);

        policy.record_failure(7).unwrap();
        policy.record_failure(7).unwrap();
        policy.record_success(7).unwrap();

        // The counter restarted, so two more failures still do not block.
        policy.record_failure(7).unwrap();
        let record = policy.record_failure(7).unwrap();
        assert!(!record.blocked_now);

        let record = policy.record_failure(7).unwrap();
        assert!(record.blocked_now);

        policy.record_success(7).unwrap();
        assert!(policy.is_blocked(7).unwrap(), "blocking is sticky");
    }
}

//! Gate policy configuration.
//!
//! Loaded once and passed by reference into the state machine; nothing in
//! the gate re-queries configuration mid-decision.

use serde::{Deserialize, Serialize};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_SETUP_PAGE: &str = "/mfa/setup";
const DEFAULT_VERIFY_PAGE: &str = "/mfa/verify";

const ENV_MFA_ENABLED: &str = "HYDROGATE_MFA_ENABLED";
const ENV_MFA_METHOD: &str = "HYDROGATE_MFA_METHOD";
const ENV_MAX_ATTEMPTS: &str = "HYDROGATE_MAX_ATTEMPTS";

/// How strictly MFA is applied to users without a confirmed HydroID.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MfaMethod {
    /// Users opt in explicitly; setup is never forced.
    Optional,
    /// Setup is offered after login but can be skipped.
    Prompted,
    /// Setup is mandatory and cannot be skipped.
    Enforced,
}

impl MfaMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Prompted => "prompted",
            Self::Enforced => "enforced",
        }
    }

    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim() {
            "optional" => Some(Self::Optional),
            "prompted" => Some(Self::Prompted),
            "enforced" => Some(Self::Enforced),
            _ => None,
        }
    }

    /// Whether a user may decline setup and proceed with primary login only.
    #[must_use]
    pub fn skippable(self) -> bool {
        matches!(self, Self::Optional | Self::Prompted)
    }
}

/// Process-wide gate policy, immutable for the lifetime of a request.
#[derive(Clone, Debug)]
pub struct PolicyConfig {
    enabled: bool,
    method: MfaMethod,
    max_attempts: u32,
    setup_page: String,
    verify_page: String,
    site_path: Option<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            method: MfaMethod::Prompted,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            setup_page: DEFAULT_SETUP_PAGE.to_string(),
            verify_page: DEFAULT_VERIFY_PAGE.to_string(),
            site_path: None,
        }
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MfaMethod) -> Self {
        self.method = method;
        self
    }

    /// `0` means unlimited attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_setup_page(mut self, page: String) -> Self {
        self.setup_page = page;
        self
    }

    #[must_use]
    pub fn with_verify_page(mut self, page: String) -> Self {
        self.verify_page = page;
        self
    }

    /// Site prefix under which cookies may also have been set, when it
    /// differs from the root path.
    #[must_use]
    pub fn with_site_path(mut self, path: Option<String>) -> Self {
        self.site_path = path;
        self
    }

    /// Load policy from environment variables, keeping defaults for
    /// anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(enabled) = parse_bool_env(ENV_MFA_ENABLED) {
            config.enabled = enabled;
        }
        if let Some(method) = std::env::var(ENV_MFA_METHOD)
            .ok()
            .and_then(|value| MfaMethod::from_str(&value))
        {
            config.method = method;
        }
        if let Some(max) = std::env::var(ENV_MAX_ATTEMPTS)
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
        {
            config.max_attempts = max;
        }
        config
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn method(&self) -> MfaMethod {
        self.method
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn setup_page(&self) -> &str {
        &self.setup_page
    }

    #[must_use]
    pub fn verify_page(&self) -> &str {
        &self.verify_page
    }

    #[must_use]
    pub fn site_path(&self) -> Option<&str> {
        self.site_path.as_deref()
    }
}

fn parse_bool_env(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|value| match value.trim() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mfa_method_round_trips() {
        for method in [MfaMethod::Optional, MfaMethod::Prompted, MfaMethod::Enforced] {
            assert_eq!(MfaMethod::from_str(method.as_str()), Some(method));
        }
        assert_eq!(MfaMethod::from_str("bogus"), None);
    }

    #[test]
    fn only_enforced_is_not_skippable() {
        assert!(MfaMethod::Optional.skippable());
        assert!(MfaMethod::Prompted.skippable());
        assert!(!MfaMethod::Enforced.skippable());
    }

    #[test]
    fn defaults_and_overrides() {
        let config = PolicyConfig::new();
        assert!(config.enabled());
        assert_eq!(config.method(), MfaMethod::Prompted);
        assert_eq!(config.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.setup_page(), DEFAULT_SETUP_PAGE);
        assert_eq!(config.verify_page(), DEFAULT_VERIFY_PAGE);

        let config = config
            .with_enabled(false)
            .with_method(MfaMethod::Enforced)
            .with_max_attempts(0)
            .with_site_path(Some("/blog".to_string()));
        assert!(!config.enabled());
        assert_eq!(config.method(), MfaMethod::Enforced);
        assert_eq!(config.max_attempts(), 0);
        assert_eq!(config.site_path(), Some("/blog"));
    }

    #[test]
    fn from_env_reads_known_values() {
        temp_env::with_vars(
            [
                (ENV_MFA_ENABLED, Some("0")),
                (ENV_MFA_METHOD, Some("enforced")),
                (ENV_MAX_ATTEMPTS, Some("5")),
            ],
            || {
                let config = PolicyConfig::from_env();
                assert!(!config.enabled());
                assert_eq!(config.method(), MfaMethod::Enforced);
                assert_eq!(config.max_attempts(), 5);
            },
        );
    }

    #[test]
    fn from_env_ignores_unparseable_values() {
        temp_env::with_vars(
            [
                (ENV_MFA_ENABLED, Some("maybe")),
                (ENV_MFA_METHOD, Some("strict")),
                (ENV_MAX_ATTEMPTS, Some("lots")),
            ],
            || {
                let config = PolicyConfig::from_env();
                assert!(config.enabled());
                assert_eq!(config.method(), MfaMethod::Prompted);
                assert_eq!(config.max_attempts(), DEFAULT_MAX_ATTEMPTS);
            },
        );
    }
}

//! The MFA state machine.
//!
//! Flow overview:
//! 1) After primary credentials succeed, `authenticate` decides whether the
//!    browser enters the MFA window (setup or verify) and issues the signed
//!    session cookie.
//! 2) Every subsequent request runs through `verify`, which validates the
//!    cookie, applies the anti-forgery check, consumes form submissions,
//!    and routes the browser between the setup and verify pages.
//! 3) A successful challenge acknowledgement retires the cookie and, for
//!    first-time flows, doubles as login completion.
//!
//! The machine is transport-free: requests come in as [`RequestContext`]
//! values and decisions leave as [`Verdict`] values, so every transition is
//! testable without a live server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use tracing::{error, info, warn};

use crate::gate::{
    attempts::AttemptPolicy,
    challenge::ChallengeStore,
    config::{MfaMethod, PolicyConfig},
    cookie::{self, SigningSecret},
    error::GateError,
    flash::{FlashLevel, FlashStore},
    identity::{IdentityClient, IdentityError},
    kv::KeyValueStore,
    profile::{MfaProfile, ProfileStore},
};

pub const FIELD_IDENTITY_SUBMIT: &str = "identity-submit";
pub const FIELD_VERIFY_SUBMIT: &str = "verify-submit";
pub const FIELD_SKIP_SETUP: &str = "skip-setup";
pub const FIELD_CANCEL: &str = "cancel";
pub const FIELD_NONCE: &str = "mfa-nonce";

pub const MARKER_FIRST_TIME_VERIFY: &str = "first-time-verify";
pub const MARKER_ACTION: &str = "action";
pub const ACTION_ENABLE: &str = "enable";
pub const ACTION_DISABLE: &str = "disable";

const MSG_NOT_CONFIGURED: &str =
    "Multi-factor authentication is not configured. Contact an administrator.";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Which gate-relevant page the request targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Page {
    Setup,
    Verify,
    Login,
    Other,
}

/// Everything the state machine needs to know about one request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    method: HttpMethod,
    page: Page,
    is_secure: bool,
    post: HashMap<String, String>,
    query: HashMap<String, String>,
    cookie: Option<String>,
    standing_login: Option<u64>,
    is_admin: bool,
}

impl RequestContext {
    #[must_use]
    pub fn new(method: HttpMethod, page: Page) -> Self {
        Self {
            method,
            page,
            is_secure: false,
            post: HashMap::new(),
            query: HashMap::new(),
            cookie: None,
            standing_login: None,
            is_admin: false,
        }
    }

    #[must_use]
    pub fn with_secure(mut self, is_secure: bool) -> Self {
        self.is_secure = is_secure;
        self
    }

    #[must_use]
    pub fn with_post(mut self, post: HashMap<String, String>) -> Self {
        self.post = post;
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    /// The host's own authenticated session, when one already exists.
    #[must_use]
    pub fn with_standing_login(mut self, user_id: Option<u64>) -> Self {
        self.standing_login = user_id;
        self
    }

    #[must_use]
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    fn post_field(&self, name: &str) -> Option<&str> {
        self.post.get(name).map(String::as_str)
    }

    fn action(&self) -> Option<&str> {
        self.query.get(MARKER_ACTION).map(String::as_str)
    }

    fn first_time_marker(&self) -> bool {
        self.query
            .get(MARKER_FIRST_TIME_VERIFY)
            .is_some_and(|value| value == "1")
    }

    fn has_submission(&self) -> bool {
        [
            FIELD_IDENTITY_SUBMIT,
            FIELD_VERIFY_SUBMIT,
            FIELD_SKIP_SETUP,
            FIELD_CANCEL,
        ]
        .iter()
        .any(|field| self.post.contains_key(*field))
    }
}

/// Where the browser is sent next.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Destination {
    Home,
    Login,
    Setup,
    Verify { first_time: bool },
    /// The destination the user originally asked for.
    Intended,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CookieDirective {
    Keep,
    Issue(String),
    Clear,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionDirective {
    Keep,
    /// MFA doubled as login completion; establish the host session now.
    EstablishLogin(u64),
    Logout,
}

/// The machine's decision for one request.
///
/// `redirect == None` means "render the current page"; `user` carries the
/// validated MFA-session user for rendering (nonce, challenge code, flash).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Verdict {
    pub user: Option<u64>,
    pub redirect: Option<Destination>,
    pub cookie: CookieDirective,
    pub session: SessionDirective,
}

impl Verdict {
    fn pass() -> Self {
        Self {
            user: None,
            redirect: None,
            cookie: CookieDirective::Keep,
            session: SessionDirective::Keep,
        }
    }

    fn redirect(destination: Destination) -> Self {
        Self {
            redirect: Some(destination),
            ..Self::pass()
        }
    }

    fn for_user(user_id: u64) -> Self {
        Self {
            user: Some(user_id),
            ..Self::pass()
        }
    }

    fn to(mut self, destination: Destination) -> Self {
        self.redirect = Some(destination);
        self
    }

    fn with_cookie(mut self, cookie: CookieDirective) -> Self {
        self.cookie = cookie;
        self
    }

    fn with_session(mut self, session: SessionDirective) -> Self {
        self.session = session;
        self
    }
}

/// Decision for the primary-login hook.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AuthOutcome {
    /// No MFA required; proceed with normal login.
    Allowed,
    /// Account is locked; reject primary login outright.
    Blocked,
    SetupRequired { cookie: String },
    VerifyRequired { cookie: String },
}

/// Whether the user must be routed to HydroID setup.
#[must_use]
pub fn requires_setup(
    profile: &MfaProfile,
    config: &PolicyConfig,
    enable_requested: bool,
) -> bool {
    if !config.enabled() {
        return false;
    }
    if enable_requested {
        return true;
    }
    match config.method() {
        MfaMethod::Optional => false,
        MfaMethod::Prompted | MfaMethod::Enforced => !requires_verify(profile, config, false),
    }
}

/// Whether the user must pass challenge verification.
///
/// A freshly set-up, not-yet-confirmed user still verifies once, signalled
/// by the first-time marker on the redirect out of setup.
#[must_use]
pub fn requires_verify(
    profile: &MfaProfile,
    config: &PolicyConfig,
    is_first_time_request: bool,
) -> bool {
    if !config.enabled() || profile.hydro_id.is_empty() || !profile.mfa_enabled {
        return false;
    }
    profile.mfa_confirmed || is_first_time_request
}

fn valid_hydro_id(hydro_id: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_-]{3,32}$").is_ok_and(|regex| regex.is_match(hydro_id))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}

/// The gate: state machine plus the seams it drives.
pub struct MfaGate<C> {
    store: Arc<dyn KeyValueStore>,
    identity: C,
    config: PolicyConfig,
    secret: SigningSecret,
}

impl<C: IdentityClient> MfaGate<C> {
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        identity: C,
        config: PolicyConfig,
        secret: SigningSecret,
    ) -> Self {
        Self {
            store,
            identity,
            config,
            secret,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn flashes(&self) -> FlashStore<'_> {
        FlashStore::new(self.store.as_ref())
    }

    fn profiles(&self) -> ProfileStore<'_> {
        ProfileStore::new(self.store.as_ref())
    }

    fn challenges(&self) -> ChallengeStore<'_> {
        ChallengeStore::new(self.store.as_ref())
    }

    fn attempts(&self) -> AttemptPolicy<'_> {
        AttemptPolicy::new(self.store.as_ref(), self.config.max_attempts())
    }

    /// Anti-forgery token embedded in the setup/verify forms.
    #[must_use]
    pub fn nonce_for(&self, user_id: u64) -> String {
        cookie::nonce(&self.secret, user_id)
    }

    /// Resolve the MFA session cookie on this request, if valid.
    #[must_use]
    pub fn session_user(&self, ctx: &RequestContext) -> Option<u64> {
        self.session_user_at(ctx, unix_now())
    }

    fn session_user_at(&self, ctx: &RequestContext, now: i64) -> Option<u64> {
        let raw = ctx.cookie.as_deref()?;
        let profiles = self.profiles();
        cookie::validate(raw, &self.secret, now, |user_id| {
            // A store failure here fails closed: no session.
            profiles.load(user_id).ok().map(|profile| profile.hydro_id)
        })
    }

    /// The challenge code to render on the verify page; stable within the
    /// TTL window.
    ///
    /// # Errors
    /// Returns a store or identity error when no challenge can be produced.
    pub async fn challenge_code(&self, user_id: u64) -> Result<i64, GateError> {
        self.challenges()
            .get_or_create(&self.identity, user_id, unix_now())
            .await
    }

    /// Primary-login hook, called after credentials succeed.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub fn authenticate(
        &self,
        user_id: u64,
        enable_requested: bool,
    ) -> Result<AuthOutcome, GateError> {
        let profile = self.profiles().load(user_id)?;
        if profile.account_blocked {
            warn!(user_id, "primary login rejected: account is blocked");
            return Ok(AuthOutcome::Blocked);
        }

        let now = unix_now();
        if requires_setup(&profile, &self.config, enable_requested) {
            info!(user_id, "MFA setup required after primary login");
            return Ok(AuthOutcome::SetupRequired {
                cookie: cookie::issue(user_id, &profile.hydro_id, &self.secret, now),
            });
        }
        if requires_verify(&profile, &self.config, false) {
            // Any challenge left over from an earlier window is stale.
            self.challenges().invalidate(user_id)?;
            info!(user_id, "MFA verification required after primary login");
            return Ok(AuthOutcome::VerifyRequired {
                cookie: cookie::issue(user_id, &profile.hydro_id, &self.secret, now),
            });
        }
        Ok(AuthOutcome::Allowed)
    }

    /// Request-verification hook, evaluated on every request behind the
    /// cookie layer.
    ///
    /// # Errors
    /// Returns an error only for store failures; identity-service outcomes
    /// are folded into the verdict.
    pub async fn verify(&self, ctx: &RequestContext) -> Result<Verdict, GateError> {
        let Some(user_id) = self.session_user_at(ctx, unix_now()) else {
            // Narrow bypass so a misconfigured gate cannot lock
            // administrators out of the verify page.
            if ctx.is_admin && ctx.page == Page::Verify {
                return Ok(Verdict::pass());
            }
            if matches!(ctx.page, Page::Setup | Page::Verify) {
                return Ok(Verdict::redirect(Destination::Home));
            }
            return Ok(Verdict::pass());
        };

        // Anti-forgery check on secure form submissions. A mismatch is a
        // hostile or stale request: tear the MFA session down and move on
        // without detail.
        if ctx.method == HttpMethod::Post && ctx.is_secure && ctx.has_submission() {
            let expected = cookie::nonce(&self.secret, user_id);
            if ctx.post_field(FIELD_NONCE) != Some(expected.as_str()) {
                warn!(user_id, "anti-forgery token mismatch, discarding MFA session");
                self.challenges().invalidate(user_id)?;
                return Ok(Verdict::redirect(Destination::Home).with_cookie(CookieDirective::Clear));
            }
        }

        if ctx.method == HttpMethod::Post {
            if let Some(submitted) = ctx.post_field(FIELD_IDENTITY_SUBMIT) {
                return self.handle_setup_submit(user_id, submitted).await;
            }
            if ctx.post_field(FIELD_VERIFY_SUBMIT).is_some() {
                return self.handle_verify_submit(user_id, ctx).await;
            }
            if ctx.post_field(FIELD_SKIP_SETUP).is_some() {
                return self.handle_skip(user_id, ctx);
            }
            if ctx.post_field(FIELD_CANCEL).is_some() {
                return self.handle_cancel(user_id, ctx);
            }
        }

        self.route(user_id, ctx)
    }

    async fn handle_setup_submit(
        &self,
        user_id: u64,
        submitted: &str,
    ) -> Result<Verdict, GateError> {
        let flashes = self.flashes();
        let hydro_id = submitted.trim();
        if !valid_hydro_id(hydro_id) {
            flashes.push(
                user_id,
                FlashLevel::Error,
                "A HydroID is 3 to 32 letters, digits, hyphens, or underscores.",
            )?;
            return Ok(Verdict::for_user(user_id).to(Destination::Setup));
        }

        match self.identity.register_identity(hydro_id).await {
            Ok(()) => {
                let profiles = self.profiles();
                let mut profile = profiles.load(user_id)?;
                profile.hydro_id = hydro_id.to_string();
                profile.mfa_enabled = true;
                profile.mfa_confirmed = false;
                profile.failed_attempts = 0;
                profiles.save(user_id, &profile)?;
                info!(user_id, "HydroID registered, first verification pending");
                // The cookie binds to the HydroID, which just changed.
                let reissued = cookie::issue(user_id, hydro_id, &self.secret, unix_now());
                Ok(Verdict::for_user(user_id)
                    .to(Destination::Verify { first_time: true })
                    .with_cookie(CookieDirective::Issue(reissued)))
            }
            Err(IdentityError::AlreadyMapped) => {
                // Clear the stale remote mapping so re-entry can succeed;
                // the profile stays untouched.
                if let Err(err) = self.identity.unregister_identity(hydro_id).await {
                    warn!(user_id, "could not clear stale HydroID mapping: {err}");
                }
                flashes.push(
                    user_id,
                    FlashLevel::Warning,
                    "That HydroID was already registered; the stale registration was removed. Enter it again to continue.",
                )?;
                Ok(Verdict::for_user(user_id).to(Destination::Setup))
            }
            Err(IdentityError::RegistrationFailed) => {
                // Full reset: setup restarts from scratch, never leaving a
                // half-configured profile behind.
                let profiles = self.profiles();
                let mut profile = profiles.load(user_id)?;
                profile.reset_mfa();
                profiles.save(user_id, &profile)?;
                flashes.push(
                    user_id,
                    FlashLevel::Error,
                    "Registering the HydroID failed. Start the setup again.",
                )?;
                let reissued = cookie::issue(user_id, &profile.hydro_id, &self.secret, unix_now());
                Ok(Verdict::for_user(user_id)
                    .to(Destination::Setup)
                    .with_cookie(CookieDirective::Issue(reissued)))
            }
            Err(IdentityError::NotConfigured) => {
                error!(user_id, "identity service rejected credentials during registration");
                flashes.push(user_id, FlashLevel::Error, MSG_NOT_CONFIGURED)?;
                Ok(Verdict::for_user(user_id).to(Destination::Setup))
            }
            Err(err) => {
                warn!(user_id, "HydroID registration error: {err}");
                flashes.push(
                    user_id,
                    FlashLevel::Error,
                    "Registering the HydroID failed. Try again.",
                )?;
                Ok(Verdict::for_user(user_id).to(Destination::Setup))
            }
        }
    }

    async fn handle_verify_submit(
        &self,
        user_id: u64,
        ctx: &RequestContext,
    ) -> Result<Verdict, GateError> {
        let profiles = self.profiles();
        let challenges = self.challenges();
        let flashes = self.flashes();
        let mut profile = profiles.load(user_id)?;
        let first_time = ctx.first_time_marker();

        let outcome = match challenges.current(user_id)? {
            Some(challenge) => {
                self.identity
                    .verify_challenge(&profile.hydro_id, challenge)
                    .await
            }
            // Expired or already consumed (e.g. a double submit); counts
            // as a failed attempt.
            None => Err(IdentityError::VerificationFailed),
        };

        match outcome {
            Ok(()) => {
                challenges.invalidate(user_id)?;
                profile.failed_attempts = 0;
                if first_time {
                    profile.mfa_confirmed = true;
                }
                if ctx.action() == Some(ACTION_DISABLE) {
                    let hydro_id = profile.hydro_id.clone();
                    if let Err(err) = self.identity.unregister_identity(&hydro_id).await {
                        warn!(user_id, "could not unregister HydroID on disable: {err}");
                    }
                    profile.reset_mfa();
                    flashes.push(
                        user_id,
                        FlashLevel::Info,
                        "Multi-factor authentication has been disabled for your account.",
                    )?;
                }
                profiles.save(user_id, &profile)?;
                info!(user_id, first_time, "MFA verification succeeded");

                let session = if ctx.standing_login.is_some() {
                    SessionDirective::Keep
                } else {
                    SessionDirective::EstablishLogin(user_id)
                };
                Ok(Verdict::for_user(user_id)
                    .to(Destination::Intended)
                    .with_cookie(CookieDirective::Clear)
                    .with_session(session))
            }
            Err(IdentityError::VerificationFailed) => {
                challenges.invalidate(user_id)?;
                let record = self.attempts().record_failure(user_id)?;
                if record.blocked_now {
                    flashes.push(
                        user_id,
                        FlashLevel::Error,
                        "Your account has been blocked after too many failed attempts. Contact an administrator.",
                    )?;
                    Ok(Verdict::for_user(user_id)
                        .to(Destination::Login)
                        .with_cookie(CookieDirective::Clear)
                        .with_session(SessionDirective::Logout))
                } else {
                    flashes.push(
                        user_id,
                        FlashLevel::Error,
                        "Verification failed. Acknowledge the new code and try again.",
                    )?;
                    Ok(Verdict::for_user(user_id).to(Destination::Verify { first_time }))
                }
            }
            Err(IdentityError::NotConfigured) => {
                error!(user_id, "identity service rejected credentials during verification");
                flashes.push(user_id, FlashLevel::Error, MSG_NOT_CONFIGURED)?;
                Ok(Verdict::for_user(user_id).to(Destination::Verify { first_time }))
            }
            Err(err) => {
                warn!(user_id, "challenge verification error: {err}");
                flashes.push(
                    user_id,
                    FlashLevel::Error,
                    "Verification is temporarily unavailable. Try again.",
                )?;
                Ok(Verdict::for_user(user_id).to(Destination::Verify { first_time }))
            }
        }
    }

    fn handle_skip(&self, user_id: u64, ctx: &RequestContext) -> Result<Verdict, GateError> {
        if !self.config.method().skippable() {
            self.flashes().push(
                user_id,
                FlashLevel::Error,
                "Multi-factor authentication is required and cannot be skipped.",
            )?;
            return Ok(Verdict::for_user(user_id).to(Destination::Setup));
        }
        info!(user_id, "MFA setup skipped");
        let session = if ctx.standing_login.is_some() {
            SessionDirective::Keep
        } else {
            SessionDirective::EstablishLogin(user_id)
        };
        Ok(Verdict::for_user(user_id)
            .to(Destination::Intended)
            .with_cookie(CookieDirective::Clear)
            .with_session(session))
    }

    fn handle_cancel(&self, user_id: u64, ctx: &RequestContext) -> Result<Verdict, GateError> {
        self.challenges().invalidate(user_id)?;
        // Cancelling a fresh setup/verify for a user with no standing login
        // just returns them anonymous; cancelling mid-re-verification of an
        // established session logs out.
        let session = if ctx.standing_login.is_some() {
            SessionDirective::Logout
        } else {
            SessionDirective::Keep
        };
        info!(user_id, "MFA flow cancelled");
        Ok(Verdict::for_user(user_id)
            .to(Destination::Home)
            .with_cookie(CookieDirective::Clear)
            .with_session(session))
    }

    fn route(&self, user_id: u64, ctx: &RequestContext) -> Result<Verdict, GateError> {
        let profile = self.profiles().load(user_id)?;
        let enable_requested = ctx.action() == Some(ACTION_ENABLE);
        let first_time = ctx.first_time_marker();

        if requires_setup(&profile, &self.config, enable_requested) {
            if ctx.page == Page::Setup {
                return Ok(Verdict::for_user(user_id));
            }
            return Ok(Verdict::for_user(user_id).to(Destination::Setup));
        }
        if requires_verify(&profile, &self.config, first_time) {
            if ctx.page == Page::Verify {
                return Ok(Verdict::for_user(user_id));
            }
            return Ok(Verdict::for_user(user_id).to(Destination::Verify { first_time }));
        }

        // Valid MFA session but nothing left to require (e.g. the policy
        // was relaxed since login): finish the login and retire the cookie.
        let session = if ctx.standing_login.is_some() {
            SessionDirective::Keep
        } else {
            SessionDirective::EstablishLogin(user_id)
        };
        Ok(Verdict::for_user(user_id)
            .to(Destination::Intended)
            .with_cookie(CookieDirective::Clear)
            .with_session(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_profile() -> MfaProfile {
        MfaProfile::default()
    }

    fn enrolled_profile(confirmed: bool) -> MfaProfile {
        MfaProfile {
            hydro_id: "abc123".to_string(),
            mfa_enabled: true,
            mfa_confirmed: confirmed,
            failed_attempts: 0,
            account_blocked: false,
        }
    }

    #[test]
    fn setup_never_required_when_globally_disabled() {
        let config = PolicyConfig::new()
            .with_enabled(false)
            .with_method(MfaMethod::Enforced);
        assert!(!requires_setup(&fresh_profile(), &config, false));
        assert!(!requires_setup(&fresh_profile(), &config, true));
        assert!(!requires_setup(&enrolled_profile(true), &config, false));
    }

    #[test]
    fn explicit_enable_forces_setup() {
        let config = PolicyConfig::new().with_method(MfaMethod::Optional);
        assert!(!requires_setup(&fresh_profile(), &config, false));
        assert!(requires_setup(&fresh_profile(), &config, true));
    }

    #[test]
    fn prompted_and_enforced_require_setup_until_verify_takes_over() {
        for method in [MfaMethod::Prompted, MfaMethod::Enforced] {
            let config = PolicyConfig::new().with_method(method);
            assert!(requires_setup(&fresh_profile(), &config, false));
            assert!(!requires_setup(&enrolled_profile(true), &config, false));
        }
    }

    #[test]
    fn unconfirmed_user_verifies_only_with_first_time_marker() {
        let config = PolicyConfig::new().with_method(MfaMethod::Enforced);
        let profile = enrolled_profile(false);
        assert!(requires_verify(&profile, &config, true));
        assert!(!requires_verify(&profile, &config, false));
    }

    #[test]
    fn confirmed_user_always_verifies() {
        let config = PolicyConfig::new();
        let profile = enrolled_profile(true);
        assert!(requires_verify(&profile, &config, false));
        assert!(requires_verify(&profile, &config, true));
    }

    #[test]
    fn verify_never_required_without_identity_or_enablement() {
        let config = PolicyConfig::new();
        assert!(!requires_verify(&fresh_profile(), &config, true));

        let mut profile = enrolled_profile(true);
        profile.mfa_enabled = false;
        assert!(!requires_verify(&profile, &config, false));

        let disabled = config.with_enabled(false);
        assert!(!requires_verify(&enrolled_profile(true), &disabled, false));
    }

    #[test]
    fn hydro_id_shape_is_checked() {
        assert!(valid_hydro_id("abc"));
        assert!(valid_hydro_id("hydro42"));
        assert!(valid_hydro_id("a_b-c"));
        assert!(valid_hydro_id(&"x".repeat(32)));
        assert!(!valid_hydro_id("ab"));
        assert!(!valid_hydro_id(&"x".repeat(33)));
        assert!(!valid_hydro_id("has space"));
        assert!(!valid_hydro_id("pipe|char"));
        assert!(!valid_hydro_id(""));
    }
}

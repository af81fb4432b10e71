//! # Hydrogate (HydroID MFA Gate)
//!
//! `hydrogate` puts a HydroID multi-factor step between primary credential
//! checks and an established login session. After a username/password
//! succeeds, the gate decides whether the browser must link a HydroID,
//! acknowledge a six-digit Raindrop challenge, or pass straight through.
//!
//! ## MFA window
//!
//! The window between primary login and MFA completion is carried by an
//! HMAC-signed cookie. The cookie holds an obfuscated user id, the linked
//! HydroID and an expiry; tampering with any of the three invalidates it.
//! No login session exists until the challenge is acknowledged.
//!
//! ## Enrollment policy
//!
//! - **optional** — users opt in from their account settings.
//! - **prompted** — users are asked at login and may skip.
//! - **enforced** — no skip; setup is required to finish logging in.
//!
//! ## Lockout
//!
//! Failed verifications beyond the configured budget lock the account.
//! The lock is sticky and only an operator clears it.

pub mod api;
pub mod cli;
pub mod gate;
pub mod raindrop;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

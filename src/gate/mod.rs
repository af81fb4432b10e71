//! Multi-factor authentication gate.
//!
//! Flow overview:
//! 1) Primary credentials succeed; `machine::MfaGate::authenticate` decides
//!    whether the browser must set up or verify a HydroID and issues the
//!    signed MFA session cookie.
//! 2) Requests inside the MFA window run through `machine::MfaGate::verify`,
//!    which consumes setup/verify/skip/cancel submissions and routes
//!    between pages.
//! 3) A successful challenge acknowledgement retires the cookie; repeated
//!    failures trip a sticky account lockout.
//!
//! Security boundaries:
//! - The session cookie is HMAC-signed; tampering with any byte of it is
//!   indistinguishable from having no session.
//! - Challenges are single-use with a fixed 90-second TTL; the store, not
//!   the caller, enforces expiry.
//! - Lockout is sticky and cleared only by an operator.

pub mod attempts;
pub mod challenge;
pub mod config;
pub mod cookie;
pub mod error;
pub mod flash;
pub mod identity;
pub mod kv;
pub mod machine;
pub mod profile;

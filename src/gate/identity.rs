//! Identity-verification service seam.
//!
//! The remote protocol is opaque to the gate; only this contract matters.
//! Expected branches (`AlreadyMapped`, `VerificationFailed`, ...) are
//! modeled as variants rather than panics or opaque errors so the state
//! machine can route each one.

use std::future::Future;

use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum IdentityError {
    #[error("challenge verification failed")]
    VerificationFailed,
    #[error("identity is already mapped to this application")]
    AlreadyMapped,
    #[error("identity registration failed")]
    RegistrationFailed,
    #[error("identity unregistration failed")]
    UnregistrationFailed,
    #[error("identity service is not configured")]
    NotConfigured,
    #[error("identity service transport failure: {0}")]
    Transport(String),
}

/// Client for the remote identity-verification service.
pub trait IdentityClient: Send + Sync {
    /// Mint a new challenge message for the companion application.
    fn generate_challenge(&self) -> impl Future<Output = Result<i64, IdentityError>> + Send;

    /// Check that the user acknowledged `challenge` for `hydro_id`.
    fn verify_challenge(
        &self,
        hydro_id: &str,
        challenge: i64,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Map `hydro_id` to this application.
    fn register_identity(
        &self,
        hydro_id: &str,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Remove the mapping for `hydro_id`.
    fn unregister_identity(
        &self,
        hydro_id: &str,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;
}

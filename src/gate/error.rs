use thiserror::Error;

use crate::gate::identity::IdentityError;

/// Failures surfaced by the MFA gate.
///
/// Store failures are fatal to the request (500-class); identity-service
/// outcomes are expected branches and handled per flow before they can
/// reach a caller as an error.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("key-value store failure: {0}")]
    Store(String),
    #[error("signing secret unavailable: {0}")]
    Secret(String),
    #[error("profile record malformed: {0}")]
    Profile(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

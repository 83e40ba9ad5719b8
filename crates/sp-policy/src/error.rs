// error.rs — Error types for the policy subsystem.

use thiserror::Error;

/// Errors that can occur managing policy profiles.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Mutation attempted on a locked profile.
    #[error("policy profile '{0}' is locked; unlock it before editing")]
    ProfileLocked(String),

    /// No profile exists with the given ID for this tenant.
    #[error("policy profile not found")]
    NotFound,

    /// The backing store failed.
    #[error("policy store error: {0}")]
    StoreFailed(String),
}

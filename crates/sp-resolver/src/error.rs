// error.rs — Error types for entity resolution.

use thiserror::Error;

/// Failures in the mapping store. The resolver itself swallows these and
/// returns an empty vernacular; they surface only to mapping maintenance
/// code.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("mapping store error: {0}")]
    StoreFailed(String),
}

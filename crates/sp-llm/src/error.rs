// error.rs — Provider failure taxonomy.
//
// The adapter maps every provider failure into one of these variants and
// never retries internally. `RateLimited` and `Unavailable` are the
// transient pair the agent loop may retry once.

use thiserror::Error;

/// Failures surfaced by an LLM adapter.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider rejected our credentials.
    #[error("provider auth error: {0}")]
    Auth(String),

    /// The provider throttled the request. Transient.
    #[error("provider rate limited: {0}")]
    RateLimited(String),

    /// The provider is down or overloaded. Transient.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected the request shape.
    #[error("provider invalid request: {0}")]
    InvalidRequest(String),

    /// The provider responded with something we could not parse.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl LlmError {
    /// Whether the agent loop may retry this failure once.
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::RateLimited(_) | LlmError::Unavailable(_))
    }
}

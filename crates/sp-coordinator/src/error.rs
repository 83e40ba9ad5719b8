// error.rs — Error types for the coordinator.

use thiserror::Error;

/// Failures that abort a whole coordinator turn. Specialist failures are
/// not here: they degrade into the synthesized answer instead.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Llm(#[from] sp_llm::LlmError),

    #[error(transparent)]
    Policy(#[from] sp_policy::PolicyError),

    /// The event channel closed mid-turn (caller cancelled).
    #[error("stream receiver dropped")]
    Cancelled,
}

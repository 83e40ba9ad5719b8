// error.rs — Error types for the assertion subsystem.

use thiserror::Error;

/// Errors raised while validating or executing assertion batches.
#[derive(Debug, Error)]
pub enum AssertError {
    /// A single assertion definition failed validation.
    #[error("invalid assertion: {0}")]
    InvalidAssertion(String),

    /// The batch is empty or too large.
    #[error("{0}")]
    InvalidBatch(String),

    /// The query is not a plain SELECT.
    #[error("only SELECT queries are permitted")]
    NotReadOnly,

    /// The query references a table outside the tenant allowlist.
    #[error("table '{0}' is not in the allowlist")]
    TableNotAllowed(String),

    #[error(transparent)]
    Sandbox(#[from] sp_sandbox::SandboxError),

    #[error(transparent)]
    Audit(#[from] sp_audit::AuditError),
}

// error.rs — Error types for tool execution.
//
// These errors never cross the dispatcher boundary; the governor folds
// them into `{"error": ...}` payloads so agent loops see structured JSON,
// not exceptions.

use thiserror::Error;

/// Failures inside tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The handler itself failed.
    #[error("{0}")]
    Handler(String),

    /// No handler is registered for a catalogued tool.
    #[error("no handler registered for tool '{0}'")]
    NotRegistered(String),

    #[error(transparent)]
    Audit(#[from] sp_audit::AuditError),
}

// error.rs — Error types for the audit subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while recording or reading audit events.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to open or create an audit log file.
    #[error("failed to open audit log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write an event.
    #[error("failed to append event: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Malformed event JSON.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The log's hash chain is broken.
    #[error("integrity check failed at line {line}: expected hash {expected}, got {actual}")]
    IntegrityViolation {
        line: usize,
        expected: String,
        actual: String,
    },

    /// The backing store rejected the append.
    #[error("audit sink rejected event: {0}")]
    SinkFailed(String),
}

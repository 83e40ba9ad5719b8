// error.rs — Error types for the workspace subsystem.

use thiserror::Error;

/// Errors that can occur during workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// A path failed validation (length, depth, charset, traversal).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The workspace does not exist for this tenant.
    #[error("workspace not found")]
    WorkspaceNotFound,

    /// The file does not exist in the workspace.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The file is locked by another user and the lock has not expired.
    #[error("file '{path}' is locked by another user")]
    FileLocked { path: String },

    /// The backing store failed.
    #[error("workspace store error: {0}")]
    StoreFailed(String),
}

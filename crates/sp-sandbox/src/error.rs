// error.rs — Error types for the sandbox subsystem.

use thiserror::Error;

use sp_changeset::ChangesetError;
use sp_workspace::WorkspaceError;

/// Errors that can occur while preparing or executing a sandbox run.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The run type is not in the command allowlist.
    #[error("run type '{0}' is not allowed")]
    CommandNotAllowed(String),

    /// The run type has no subprocess; it is driven internally.
    #[error("run type '{0}' is executed by the assertion engine, not a subprocess")]
    InternalRunType(String),

    /// No run with this ID exists for the tenant.
    #[error("run not found")]
    RunNotFound,

    /// The run's changeset overlay could not be built.
    #[error("changeset not found for run materialization")]
    ChangesetMissing,

    /// The overlay changeset is not approved.
    #[error("changeset must be approved before run execution (current: {0})")]
    ChangesetNotApproved(String),

    /// A patch baseline no longer matches the workspace snapshot.
    #[error("patch baseline hash mismatch for {path}")]
    BaselineMismatch { path: String },

    /// A modify patch targets a file missing from the snapshot.
    #[error("patch modify target does not exist in workspace snapshot: {path}")]
    SnapshotTargetMissing { path: String },

    /// A resolved path escaped the scratch root.
    #[error("path traversal detected while materializing snapshot: {path}")]
    PathEscape { path: String },

    /// The subprocess outlived its wall-clock timeout.
    #[error("command timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Scratch-directory or subprocess I/O failure.
    #[error("sandbox io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Changeset(#[from] ChangesetError),

    #[error(transparent)]
    Audit(#[from] sp_audit::AuditError),

    /// The backing store failed.
    #[error("run store error: {0}")]
    StoreFailed(String),
}

// error.rs — Error types for the changeset subsystem.

use thiserror::Error;

use sp_workspace::WorkspaceError;

use crate::state::{ChangesetState, TransitionAction};

/// Errors that can occur during changeset operations.
#[derive(Debug, Error)]
pub enum ChangesetError {
    /// No changeset with this ID exists for the tenant.
    #[error("changeset not found")]
    NotFound,

    /// The requested action is not valid from the current state.
    #[error("action '{action}' not valid for status '{from}'")]
    InvalidTransition {
        from: ChangesetState,
        action: TransitionAction,
    },

    /// Apply attempted on a changeset that is not approved.
    #[error("changeset must be approved before applying (current: {0})")]
    NotApproved(ChangesetState),

    /// A modify target changed since the patch was proposed.
    #[error("conflict detected on {path}: file was modified since the patch was proposed")]
    Conflict { path: String },

    /// The unified diff could not be parsed.
    #[error("could not parse unified diff: {0}")]
    DiffParse(String),

    /// The diff parsed but its context no longer matches the file.
    #[error("patch does not apply to {path}: {reason}")]
    PatchDoesNotApply { path: String, reason: String },

    /// The diff exceeds the size cap.
    #[error("diff exceeds maximum size of {max} bytes")]
    DiffTooLarge { max: usize },

    /// A modify patch carries neither a diff nor replacement content.
    #[error("modify patch has no diff or content for {path}")]
    EmptyModify { path: String },

    /// A modify patch targets a file that no longer exists.
    #[error("file not found for modify: {path}")]
    ModifyTargetMissing { path: String },

    /// Another apply currently holds this changeset's row lock.
    #[error("changeset is locked by a concurrent apply")]
    ApplyLockBusy,

    /// Path or file-level failure from the workspace layer.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// The backing store failed.
    #[error("changeset store error: {0}")]
    StoreFailed(String),
}

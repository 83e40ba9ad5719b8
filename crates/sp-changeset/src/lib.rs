//! # sp-changeset
//!
//! Reviewed file modifications for SuitePilot workspaces.
//!
//! A [`Changeset`] bundles one or more [`Patch`]es and travels through a
//! fixed review state machine (draft, pending_review, approved, applied,
//! rejected). Modify patches carry the SHA-256 of the content they were
//! proposed against; apply refuses to proceed when the file has drifted,
//! so concurrent writers surface as [`ChangesetError::Conflict`] instead
//! of silent clobbering.

pub mod changeset;
pub mod diff;
pub mod error;
pub mod ops;
pub mod patch;
pub mod state;
pub mod store;

pub use changeset::Changeset;
pub use diff::{apply_unified_diff, create_unified_diff};
pub use error::ChangesetError;
pub use ops::{
    apply_changeset, changeset_diff_preview, propose_patch, transition_changeset,
    FileDiffPreview, ProposalOutcome,
};
pub use patch::{Patch, PatchOperation};
pub use state::{ChangesetState, TransitionAction};
pub use store::{ApplyGuard, ChangesetStore};

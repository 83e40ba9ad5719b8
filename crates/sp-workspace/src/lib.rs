//! # sp-workspace
//!
//! Virtual workspaces for SuiteScript sources.
//!
//! A [`Workspace`] is a named, tenant-owned container of
//! [`WorkspaceFile`]s. Files live in the repository rather than on disk;
//! the sandbox runner materializes them into a scratch directory when a
//! run needs a real filesystem. Paths are validated strictly (no
//! traversal, bounded length and depth, restricted character set) and
//! files carry advisory locks that expire after thirty minutes.

pub mod error;
pub mod file;
pub mod path;
pub mod store;

pub use error::WorkspaceError;
pub use file::{Workspace, WorkspaceFile, WorkspaceStatus, LOCK_EXPIRY};
pub use path::validate_path;
pub use store::WorkspaceStore;

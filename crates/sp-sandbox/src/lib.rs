//! # sp-sandbox
//!
//! Sandboxed validation runs for SuitePilot workspaces.
//!
//! A [`Run`] executes one allowlisted command against a snapshot of a
//! workspace, optionally overlaid with an approved changeset. The snapshot
//! is materialized into a scratch directory, the subprocess runs with a
//! minimal environment and a hard wall-clock timeout, and every captured
//! byte stream is redacted and size-capped before being stored as an
//! immutable [`Artifact`].

pub mod allowlist;
pub mod artifact;
pub mod error;
pub mod materialize;
pub mod run;
pub mod runner;
pub mod store;
pub mod subprocess;

pub use allowlist::{command_spec, CommandSpec};
pub use artifact::{sanitize_artifact_content, Artifact, ArtifactType, MAX_ARTIFACT_BYTES};
pub use error::SandboxError;
pub use run::{Run, RunStatus, RunType};
pub use runner::SandboxRunner;
pub use store::RunStore;
pub use subprocess::{Subprocess, SubprocessOutput, TokioSubprocess};

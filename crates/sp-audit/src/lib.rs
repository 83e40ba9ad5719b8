//! # sp-audit
//!
//! Append-only audit trail for SuitePilot.
//!
//! Every governed operation in the system (tool call, changeset transition,
//! sandbox run, deploy-gate decision) is recorded as an [`AuditEvent`].
//! Events are written through an [`AuditSink`] and are never updated or
//! deleted. A correlation ID threads one user interaction through every
//! event it causes, including events emitted transitively by agents and
//! sandbox runs.

pub mod error;
pub mod event;
pub mod hasher;
pub mod jsonl;
pub mod scrub;
pub mod sink;

pub use error::AuditError;
pub use event::{AuditEvent, AuditStatus};
pub use jsonl::JsonlAuditSink;
pub use scrub::scrub_payload;
pub use sink::AuditSink;

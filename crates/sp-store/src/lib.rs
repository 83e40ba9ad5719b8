//! # sp-store
//!
//! An in-memory, tenant-scoped implementation of every store capability
//! the core consumes: workspaces and files, changesets and patches,
//! policies, entity mappings, runs and artifacts, and the audit sink.
//!
//! Every read and write is filtered by tenant ID; cross-tenant listing
//! exists only behind an explicit [`AdminCapability`]. The production
//! deployment replaces this crate with a SQL-backed repository carrying
//! the same traits; tests and the local CLI run on this one.

pub mod memory;

pub use memory::{AdminCapability, MemoryStore};

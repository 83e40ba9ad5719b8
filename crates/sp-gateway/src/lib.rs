//! # sp-gateway
//!
//! Binds the engines to the governed tool surface.
//!
//! Every local tool in the catalog that the core itself implements gets a
//! handler here: workspace reads and searches, patch proposal and apply
//! through the changeset state machine, sandbox validation and test runs,
//! assertion batches, and the gated sandbox deploy. The service entry
//! point calls [`build_dispatcher`] once at startup and hands the result
//! to the agent runner.
//!
//! Tools the core only consumes (schedules, reconciliation, report
//! export) are catalogued but not registered here; the surrounding
//! service registers their handlers next to its connectors.

pub mod handlers;
pub mod wiring;

pub use wiring::{build_dispatcher, GatewayDeps};

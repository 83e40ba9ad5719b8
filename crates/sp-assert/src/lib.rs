//! # sp-assert
//!
//! SuiteQL assertions as a deploy gate.
//!
//! An [`Assertion`] pairs a SELECT-only, table-allowlisted query with an
//! expected condition. Batches execute serially through an injected
//! [`QueryExecutor`] and produce a [`Report`]; the
//! [deploy gate](gate::evaluate_deploy_gate) then decides whether a
//! changeset may be deployed based on its passing runs, with auditable
//! overrides for the assertion prerequisite only.

pub mod assertion;
pub mod engine;
pub mod error;
pub mod executor;
pub mod gate;
pub mod sql;

pub use assertion::{Assertion, AssertionStatus, Expected, ExpectedType, Operator};
pub use engine::{execute_assertion_run, execute_assertions, AssertionResult, Report, ReportSummary};
pub use error::AssertError;
pub use executor::{QueryExecutor, QueryResult};
pub use gate::{evaluate_deploy_gate, GateDecision, GateOverride};

//! # sp-agents
//!
//! Specialist agents for the coordinator.
//!
//! Each specialist is a bounded loop over one LLM conversation: call the
//! model, execute any requested tools through policy and governance, feed
//! the results back, and stop on the first text-only response (or after
//! `max_steps`, with one final tools-less call to force a user-facing
//! answer). Specialists never write to persistent stores directly; they
//! act only through governed tools.

pub mod result;
pub mod runner;
pub mod spec;
pub mod specialists;

pub use result::{AgentResult, ToolCallRecord};
pub use runner::AgentRunner;
pub use spec::AgentSpec;
pub use specialists::{analysis_spec, rag_spec, suiteql_spec, workspace_spec, AGENT_NAMES};

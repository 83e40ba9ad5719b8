//! # sp-tools
//!
//! The tool catalog, dispatcher, and governance engine.
//!
//! Tools are described once in the [`catalog`](descriptor::ToolCatalog)
//! and executed only through the [`Dispatcher`], which routes external
//! names to remote connectors and everything else through
//! [`governed_execute`](governor::governed_execute): rate limit, parameter
//! allowlist, audit, execute, redact, audit. The dispatcher never raises
//! to its caller; every failure is structured result JSON so an agent
//! loop can continue deterministically.

pub mod context;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod governor;
pub mod handler;
pub mod metrics;
pub mod random;
pub mod rate_limit;
pub mod redact;
pub mod sanitize;
pub mod secret;

pub use context::ToolContext;
pub use descriptor::{ToolCatalog, ToolDescriptor};
pub use dispatch::{Dispatcher, McpConnector};
pub use error::ToolError;
pub use governor::governed_execute;
pub use handler::{ToolHandler, ToolRegistry};
pub use metrics::ToolMetrics;
pub use random::{RandomSource, SystemRandom};
pub use rate_limit::{RateClock, RateLimiter, SystemClock};
pub use redact::redact_result;
pub use sanitize::{parse_external_name, sanitize_tool_name, ExternalToolName};
pub use secret::SecretStore;

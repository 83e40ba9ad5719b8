//! # sp-coordinator
//!
//! The multi-agent coordinator.
//!
//! One inbound user message becomes: an intent (fast heuristics first,
//! cheap-LLM planning only for the ambiguous remainder), a route of
//! specialist agents dispatched under a shared output-token budget, and a
//! synthesized answer streamed back as [`ChatEvent`]s. The synthesis
//! prompt is deliberately lean: persona, constraints, and formatting
//! rules only; tool inventories and SQL dialect rules live on the
//! specialists.

pub mod coordinator;
pub mod error;
pub mod intent;
pub mod plan;
pub mod route;
pub mod stream;
pub mod synthesis;

pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorResult};
pub use error::CoordinatorError;
pub use intent::{classify_intent, IntentType};
pub use plan::{CoordinatorPlan, PlanStep};
pub use route::{route_for, RouteConfig};
pub use stream::ChatEvent;

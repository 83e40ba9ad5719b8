// route.rs — The fixed intent → agents registry.

use crate::intent::IntentType;

/// Agents to dispatch for one intent, in execution order.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub intent: IntentType,
    pub agents: &'static [&'static str],
    pub parallel: bool,
}

/// The route for a classified intent. `Ambiguous` has no fixed route;
/// the coordinator plans with the cheap LLM instead.
pub fn route_for(intent: IntentType) -> Option<RouteConfig> {
    match intent {
        IntentType::Documentation => Some(RouteConfig {
            intent,
            agents: &["rag"],
            parallel: false,
        }),
        IntentType::DataQuery => Some(RouteConfig {
            intent,
            agents: &["suiteql"],
            parallel: false,
        }),
        IntentType::WorkspaceDev => Some(RouteConfig {
            intent,
            agents: &["workspace"],
            parallel: false,
        }),
        // Data first, then interpretation; the analysis specialist
        // consumes the suiteql result, so this route is sequential.
        IntentType::Analysis => Some(RouteConfig {
            intent,
            agents: &["suiteql", "analysis"],
            parallel: false,
        }),
        IntentType::Ambiguous => None,
    }
}

// dispatch.rs — Tool call routing.
//
// The dispatcher receives the sanitized name the LLM produced. External
// names (`ext__<hex>__<tool>`) resolve to a remote connector; everything
// else resolves through the catalog to a local handler and runs under the
// governor. All failure modes return structured JSON: the agent loop must
// be able to feed any outcome straight back to the model.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use sp_audit::AuditSink;

use crate::context::ToolContext;
use crate::descriptor::ToolCatalog;
use crate::governor::governed_execute;
use crate::handler::ToolRegistry;
use crate::metrics::ToolMetrics;
use crate::rate_limit::{RateClock, RateLimiter};
use crate::sanitize::parse_external_name;

/// A remote MCP connector exposing external tools.
#[async_trait]
pub trait McpConnector: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// Invoke a remote tool. Errors come back as strings and are folded
    /// into result JSON by the dispatcher.
    async fn call_tool(&self, tool: &str, args: Value) -> Result<Value, String>;
}

/// Routes sanitized tool names to local handlers or remote connectors.
pub struct Dispatcher {
    catalog: ToolCatalog,
    registry: ToolRegistry,
    connectors: HashMap<Uuid, Arc<dyn McpConnector>>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn RateClock>,
    metrics: Arc<ToolMetrics>,
    audit: Arc<dyn AuditSink>,
}

impl Dispatcher {
    pub fn new(
        catalog: ToolCatalog,
        registry: ToolRegistry,
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn RateClock>,
        metrics: Arc<ToolMetrics>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            catalog,
            registry,
            connectors: HashMap::new(),
            limiter,
            clock,
            metrics,
            audit,
        }
    }

    /// Register a remote connector by ID.
    pub fn add_connector(&mut self, connector_id: Uuid, connector: Arc<dyn McpConnector>) {
        self.connectors.insert(connector_id, connector);
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Execute a tool call named in sanitized form.
    pub async fn execute(&self, sanitized_name: &str, args: Value, ctx: &ToolContext) -> Value {
        // External tools are resolved at dispatch time, not registered.
        if let Some(external) = parse_external_name(sanitized_name) {
            let Some(connector) = self.connectors.get(&external.connector_id) else {
                return json!({
                    "error": format!("Unknown connector for tool '{}'", sanitized_name),
                });
            };
            if !connector.is_enabled() {
                return json!({
                    "error": format!("Connector for tool '{}' is disabled", sanitized_name),
                });
            }
            return match connector.call_tool(&external.tool, args).await {
                Ok(result) => result,
                Err(message) => {
                    warn!(tool = sanitized_name, error = %message, "external tool failed");
                    json!({"error": message})
                }
            };
        }

        let Some(descriptor) = self.catalog.resolve_sanitized(sanitized_name) else {
            return json!({
                "error": format!("Tool '{}' is not allowed in chat.", sanitized_name),
            });
        };

        let Some(handler) = self.registry.get(descriptor.name) else {
            return json!({
                "error": format!("Tool '{}' is not allowed in chat.", sanitized_name),
            });
        };

        governed_execute(
            descriptor,
            handler.as_ref(),
            &self.limiter,
            self.clock.as_ref(),
            &self.metrics,
            self.audit.as_ref(),
            ctx,
            args,
        )
        .await
    }
}

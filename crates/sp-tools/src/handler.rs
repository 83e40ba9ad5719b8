// handler.rs — Tool handlers and the local registry.
//
// A handler implements one catalogued tool. Handlers capture whatever
// stores or connectors they need at construction; the registry maps
// canonical names to handlers and is built once at startup alongside the
// catalog.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ToolContext;
use crate::error::ToolError;

/// One callable, governed tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute with validated parameters. A returned error is folded into
    /// a `{"error": ...}` payload by the governor, never raised further.
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value, ToolError>;
}

/// Canonical name → handler.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, canonical_name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(canonical_name.into(), handler);
    }

    pub fn get(&self, canonical_name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(canonical_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, _ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
            Ok(json!({"echo": params}))
        }
    }

    #[tokio::test]
    async fn registry_resolves_and_calls() {
        let mut registry = ToolRegistry::new();
        registry.register("health", Arc::new(EchoHandler));

        let handler = registry.get("health").unwrap();
        let ctx = ToolContext::new(Uuid::new_v4(), None, "corr");
        let result = handler.call(&ctx, json!({"a": 1})).await.unwrap();
        assert_eq!(result["echo"]["a"], 1);

        assert!(registry.get("missing").is_none());
    }
}

// context.rs — The per-call tool context.
//
// Replaces ambient "current user/tenant" state with an explicit value
// threaded through every call site. The correlation ID here flows into
// every audit event the call causes, including those emitted transitively
// by agents and sandbox runs.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::random::RandomSource;

/// Identity and correlation for one governed tool call.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub tenant_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub correlation_id: String,
    /// Entitlement classes granted to the tenant's plan.
    pub entitlements: BTreeSet<String>,
}

impl ToolContext {
    pub fn new(tenant_id: Uuid, actor_id: Option<Uuid>, correlation_id: impl Into<String>) -> Self {
        Self {
            tenant_id,
            actor_id,
            correlation_id: correlation_id.into(),
            entitlements: BTreeSet::new(),
        }
    }

    /// Build a context for an interaction that arrived without a
    /// correlation ID, minting one from the injected source.
    pub fn with_generated_correlation(
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        random: &dyn RandomSource,
    ) -> Self {
        Self::new(tenant_id, actor_id, random.uuid().to_string())
    }

    /// Grant entitlement classes and return self (builder pattern).
    pub fn with_entitlements<I, S>(mut self, entitlements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entitlements = entitlements.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_entitlement(&self, class: &str) -> bool {
        self.entitlements.contains(class)
    }
}

// event.rs — Audit event data model.
//
// Every significant action in the system is recorded as an AuditEvent.
// Events are append-only: once written they are never updated or deleted.
// For a single governed tool call the emission order is fixed:
// `tool.requested` (pending) followed by exactly one terminal event
// (`tool.executed`, `tool.failed`, or `tool.rate_limited`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scrub::scrub_payload;

/// Terminal or pending status of the action an event records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// The action completed normally.
    Success,
    /// The action was refused before execution (rate limit, policy).
    Denied,
    /// The action started but failed.
    Error,
    /// The action has been requested and has not yet reached an outcome.
    Pending,
}

/// A single audit record.
///
/// `category` groups events coarsely ("tool_call", "workspace", "deploy");
/// `action` names the specific step ("tool.requested", "run_started",
/// "deploy.gate_override"). The correlation ID ties every event caused by
/// one user interaction together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this event.
    pub event_id: Uuid,

    /// Owning tenant. Every audit row is tenant-scoped.
    pub tenant_id: Uuid,

    /// The user or agent that caused the action, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,

    /// Coarse event group (e.g. "tool_call", "workspace", "deploy").
    pub category: String,

    /// Specific action name (e.g. "tool.requested", "run_started").
    pub action: String,

    /// Kind of resource affected (e.g. "mcp_tool", "workspace_run").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Identifier of the affected resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// Threads one user interaction through all events it causes.
    pub correlation_id: String,

    /// Structured detail. Sensitive keys are scrubbed before storage.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,

    pub status: AuditStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When this event occurred (UTC).
    pub timestamp: DateTime<Utc>,

    /// Hash of the previous event in a chained log. Set by the sink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
}

impl AuditEvent {
    /// Create a new event with the current timestamp and a random ID.
    ///
    /// Most optional fields start empty; set them with the builder methods.
    pub fn new(
        tenant_id: Uuid,
        category: impl Into<String>,
        action: impl Into<String>,
        correlation_id: impl Into<String>,
        status: AuditStatus,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            tenant_id,
            actor_id: None,
            category: category.into(),
            action: action.into(),
            resource_type: None,
            resource_id: None,
            correlation_id: correlation_id.into(),
            payload: serde_json::Value::Null,
            status,
            error_message: None,
            timestamp: Utc::now(),
            previous_hash: None,
        }
    }

    /// Set the actor and return self (builder pattern).
    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Set the affected resource and return self.
    pub fn with_resource(mut self, kind: impl Into<String>, id: impl Into<String>) -> Self {
        self.resource_type = Some(kind.into());
        self.resource_id = Some(id.into());
        self
    }

    /// Attach a payload, scrubbing sensitive keys, and return self.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = scrub_payload(payload);
        self
    }

    /// Set the error message and return self.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_serialization_round_trip() {
        let event = AuditEvent::new(
            Uuid::new_v4(),
            "tool_call",
            "tool.requested",
            "corr-1",
            AuditStatus::Pending,
        )
        .with_resource("mcp_tool", "netsuite.suiteql")
        .with_payload(json!({"query": "SELECT 1"}));

        let text = serde_json::to_string(&event).expect("serialize");
        let restored: AuditEvent = serde_json::from_str(&text).expect("deserialize");

        assert_eq!(event.event_id, restored.event_id);
        assert_eq!(event.tenant_id, restored.tenant_id);
        assert_eq!(restored.action, "tool.requested");
        assert_eq!(restored.status, AuditStatus::Pending);
        assert_eq!(restored.resource_id.as_deref(), Some("netsuite.suiteql"));
    }

    #[test]
    fn status_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuditStatus::Denied).unwrap(),
            "\"denied\""
        );
    }

    #[test]
    fn event_ids_are_unique() {
        let tenant = Uuid::new_v4();
        let e1 = AuditEvent::new(tenant, "tool_call", "x", "c", AuditStatus::Success);
        let e2 = AuditEvent::new(tenant, "tool_call", "x", "c", AuditStatus::Success);
        assert_ne!(e1.event_id, e2.event_id);
    }

    #[test]
    fn payload_is_scrubbed_on_attach() {
        let event = AuditEvent::new(
            Uuid::new_v4(),
            "tool_call",
            "tool.requested",
            "corr",
            AuditStatus::Pending,
        )
        .with_payload(json!({"query": "SELECT 1", "api_key": "sk-12345"}));

        assert_eq!(event.payload["query"], "SELECT 1");
        assert!(event.payload.get("api_key").is_none());
    }

    #[test]
    fn optional_fields_are_skipped_in_json() {
        let event = AuditEvent::new(
            Uuid::new_v4(),
            "workspace",
            "run_started",
            "corr",
            AuditStatus::Success,
        );
        let text = serde_json::to_string(&event).unwrap();
        assert!(!text.contains("actor_id"));
        assert!(!text.contains("error_message"));
        assert!(!text.contains("payload"));
    }
}

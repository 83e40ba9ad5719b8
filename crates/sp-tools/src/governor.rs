// governor.rs — The governance pipeline around every local tool call.
//
// Order is fixed: the rate-limit decision is made before parameter
// validation, and audits for one call are always written requested first,
// then exactly one terminal event (rate_limited/denied, failed, or
// executed) with the same correlation ID. Handler failures are folded
// into `{"error": ...}` payloads and never unwind past this function.

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use sp_audit::{AuditEvent, AuditSink, AuditStatus};

use crate::context::ToolContext;
use crate::descriptor::ToolDescriptor;
use crate::error::ToolError;
use crate::handler::ToolHandler;
use crate::metrics::ToolMetrics;
use crate::rate_limit::{RateClock, RateLimiter};
use crate::redact::redact_result;

/// Cap on error text recorded in audit events.
const MAX_AUDIT_ERROR_CHARS: usize = 500;

/// Run one governed tool call end to end, returning result JSON.
#[allow(clippy::too_many_arguments)]
pub async fn governed_execute(
    descriptor: &ToolDescriptor,
    handler: &dyn ToolHandler,
    limiter: &RateLimiter,
    clock: &dyn RateClock,
    metrics: &ToolMetrics,
    audit: &dyn AuditSink,
    ctx: &ToolContext,
    args: Value,
) -> Value {
    let tool = descriptor.name;

    // Entitlement gate. Plans without the tool's class never reach the
    // rate limiter.
    if let Some(required) = descriptor.requires_entitlement {
        if !ctx.has_entitlement(required) {
            metrics.record_call(tool, "denied");
            if let Err(err) = append_requested(audit, ctx, tool, &args).await {
                warn!(tool, error = %err, "audit write failed");
            }
            if let Err(err) = append_terminal(
                audit,
                ctx,
                tool,
                "tool.denied",
                AuditStatus::Denied,
                json!({"tool_name": tool, "reason": "missing_entitlement"}),
                Some(&format!("Missing entitlement '{}'", required)),
            )
            .await
            {
                warn!(tool, error = %err, "audit write failed");
            }
            return json!({
                "error": format!("Missing entitlement '{}'", required),
                "tool": tool,
            });
        }
    }

    // Rate decision first, before any parameter handling.
    let within_limit =
        limiter.check_and_record(clock, ctx.tenant_id, tool, descriptor.rate_limit_per_minute);
    if !within_limit {
        warn!(
            tool,
            tenant_id = %ctx.tenant_id,
            correlation_id = %ctx.correlation_id,
            status = "denied",
            "tool call rate limited"
        );
        metrics.record_rate_limit_rejection(tool);
        metrics.record_call(tool, "denied");

        if let Err(err) = append_requested(audit, ctx, tool, &args).await {
            warn!(tool, error = %err, "audit write failed");
        }
        if let Err(err) = append_terminal(
            audit,
            ctx,
            tool,
            "tool.rate_limited",
            AuditStatus::Denied,
            json!({
                "tool_name": tool,
                "result_summary": {"status": "error", "error": "Rate limit exceeded"},
            }),
            Some("Rate limit exceeded"),
        )
        .await
        {
            warn!(tool, error = %err, "audit write failed");
        }

        return json!({"error": "Rate limit exceeded", "tool": tool});
    }

    let validated = validate_params(descriptor, args);

    if let Err(err) = append_requested(audit, ctx, tool, &validated).await {
        warn!(tool, error = %err, "audit write failed");
    }

    let started = std::time::Instant::now();
    let outcome = handler.call(ctx, validated.clone()).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            let redacted = redact_result(result);
            let row_count = redacted.get("row_count").cloned().unwrap_or(json!(0));

            metrics.record_call(tool, "success");
            if let Err(err) = append_terminal(
                audit,
                ctx,
                tool,
                "tool.executed",
                AuditStatus::Success,
                json!({
                    "tool_name": tool,
                    "params": validated,
                    "result_summary": {"status": "success", "row_count": row_count},
                    "duration_ms": duration_ms,
                }),
                None,
            )
            .await
            {
                warn!(tool, error = %err, "audit write failed");
            }

            info!(
                tool,
                tenant_id = %ctx.tenant_id,
                correlation_id = %ctx.correlation_id,
                duration_ms,
                status = "success",
                "tool call executed"
            );
            redacted
        }
        Err(error) => {
            let message: String = error.to_string().chars().take(MAX_AUDIT_ERROR_CHARS).collect();

            metrics.record_call(tool, "failed");
            if let Err(err) = append_terminal(
                audit,
                ctx,
                tool,
                "tool.failed",
                AuditStatus::Error,
                json!({
                    "tool_name": tool,
                    "params": validated,
                    "result_summary": {"status": "error", "error": message},
                    "duration_ms": duration_ms,
                }),
                Some(&message),
            )
            .await
            {
                warn!(tool, error = %err, "audit write failed");
            }

            warn!(
                tool,
                tenant_id = %ctx.tenant_id,
                correlation_id = %ctx.correlation_id,
                duration_ms,
                status = "error",
                "tool call failed"
            );
            json!({"error": message})
        }
    }
}

/// Drop unknown keys and normalize the `limit` parameter.
pub fn validate_params(descriptor: &ToolDescriptor, args: Value) -> Value {
    let Value::Object(map) = args else {
        return Value::Object(Map::new());
    };

    let mut filtered: Map<String, Value> = map
        .into_iter()
        .filter(|(key, _)| descriptor.allowed_params.contains(&key.as_str()))
        .collect();

    if descriptor.allowed_params.contains(&"limit") {
        if let Some(default) = descriptor.default_limit {
            let supplied = filtered.get("limit").and_then(Value::as_u64);
            let effective = match supplied {
                None => default,
                Some(value) => match descriptor.max_limit {
                    Some(max) if value > max => max,
                    _ => value,
                },
            };
            filtered.insert("limit".to_string(), json!(effective));
        }
    }

    Value::Object(filtered)
}

async fn append_requested(
    audit: &dyn AuditSink,
    ctx: &ToolContext,
    tool: &str,
    params: &Value,
) -> Result<(), ToolError> {
    let mut event = AuditEvent::new(
        ctx.tenant_id,
        "tool_call",
        "tool.requested",
        ctx.correlation_id.clone(),
        AuditStatus::Pending,
    )
    .with_resource("mcp_tool", tool)
    .with_payload(json!({"tool_name": tool, "params": params}));
    if let Some(actor) = ctx.actor_id {
        event = event.with_actor(actor);
    }
    audit.append(event).await?;
    Ok(())
}

async fn append_terminal(
    audit: &dyn AuditSink,
    ctx: &ToolContext,
    tool: &str,
    action: &str,
    status: AuditStatus,
    payload: Value,
    error_message: Option<&str>,
) -> Result<(), ToolError> {
    let mut event = AuditEvent::new(
        ctx.tenant_id,
        "tool_call",
        action,
        ctx.correlation_id.clone(),
        status,
    )
    .with_resource("mcp_tool", tool)
    .with_payload(payload);
    if let Some(actor) = ctx.actor_id {
        event = event.with_actor(actor);
    }
    if let Some(message) = error_message {
        event = event.with_error(message);
    }
    audit.append(event).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ToolCatalog;
    use serde_json::json;

    #[test]
    fn unknown_params_are_dropped() {
        let catalog = ToolCatalog::new();
        let descriptor = catalog.get("netsuite.suiteql").unwrap();
        let validated = validate_params(
            descriptor,
            json!({"query": "SELECT 1", "limit": 10, "sneaky": true}),
        );
        assert_eq!(validated, json!({"query": "SELECT 1", "limit": 10}));
    }

    #[test]
    fn default_limit_is_injected() {
        let catalog = ToolCatalog::new();
        let descriptor = catalog.get("netsuite.suiteql").unwrap();
        let validated = validate_params(descriptor, json!({"query": "SELECT 1"}));
        assert_eq!(validated["limit"], 100);
    }

    #[test]
    fn oversized_limit_is_capped() {
        let catalog = ToolCatalog::new();
        let descriptor = catalog.get("netsuite.suiteql").unwrap();
        let validated = validate_params(descriptor, json!({"query": "q", "limit": 99999}));
        assert_eq!(validated["limit"], 1000);
    }

    #[test]
    fn non_object_args_become_empty_object() {
        let catalog = ToolCatalog::new();
        let descriptor = catalog.get("health").unwrap();
        assert_eq!(validate_params(descriptor, json!("nope")), json!({}));
    }

    #[test]
    fn tools_without_limit_param_are_untouched() {
        let catalog = ToolCatalog::new();
        let descriptor = catalog.get("workspace.read_file").unwrap();
        let validated = validate_params(
            descriptor,
            json!({"workspace_id": "w", "file_id": "f", "limit": 5}),
        );
        // `limit` is not in this tool's allowlist, so it is dropped.
        assert!(validated.get("limit").is_none());
    }
}

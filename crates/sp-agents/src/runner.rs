// runner.rs — The bounded specialist loop.
//
// Each turn: call the model; if it answered in plain text, done. If it
// requested tools, evaluate each against the active policy, dispatch the
// allowed ones, redact their outputs, record the call log, and feed the
// results back. After max_steps the loop forces one final tools-less call
// so the coordinator always receives prose, not a dangling tool request.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use sp_llm::{ChatMessage, ChatRequest, LlmAdapter, LlmResponse};
use sp_policy::{evaluate, redact_output, PolicyProfile};
use sp_tools::{Dispatcher, ToolContext};
use sp_workspace::WorkspaceStore;

use crate::result::{AgentResult, ToolCallRecord};
use crate::spec::AgentSpec;

/// Runs specialist loops against the shared dispatcher.
pub struct AgentRunner {
    llm: Arc<dyn LlmAdapter>,
    dispatcher: Arc<Dispatcher>,
    workspaces: Arc<dyn WorkspaceStore>,
}

impl AgentRunner {
    pub fn new(
        llm: Arc<dyn LlmAdapter>,
        dispatcher: Arc<Dispatcher>,
        workspaces: Arc<dyn WorkspaceStore>,
    ) -> Self {
        Self {
            llm,
            dispatcher,
            workspaces,
        }
    }

    /// Execute one specialist against a task.
    ///
    /// `prior_results` carries earlier agents' outputs for composite
    /// routes; `policy` is the tenant's active profile, already loaded by
    /// the coordinator and immutable for the run.
    pub async fn run(
        &self,
        spec: &AgentSpec,
        model: &str,
        task: &str,
        prior_results: Option<&Value>,
        policy: Option<&PolicyProfile>,
        ctx: &ToolContext,
    ) -> AgentResult {
        let mut call_log: Vec<ToolCallRecord> = Vec::new();
        let mut usage = sp_llm::TokenUsage::default();

        let mut first_user_message = format!("Task: {}", task);
        if let Some(prior) = prior_results {
            first_user_message.push_str(&format!(
                "\n\n<prior_agent_results>\n{}\n</prior_agent_results>",
                prior
            ));
        }

        let mut messages = vec![ChatMessage::user_text(first_user_message)];

        for step in 0..spec.max_steps {
            let request = ChatRequest {
                model: model.to_string(),
                max_tokens: spec.max_tokens,
                system: spec.system_prompt.clone(),
                messages: messages.clone(),
                tools: spec.tools.clone(),
            };

            let response = match self.call_with_retry(&request).await {
                Ok(response) => response,
                Err(message) => {
                    warn!(agent = %spec.name, error = %message, "agent llm call failed");
                    let mut result = AgentResult::failure(&spec.name, message);
                    result.tool_calls = call_log;
                    result.tokens_used = usage;
                    return result;
                }
            };
            usage.add(response.usage);

            if response.tool_use_blocks.is_empty() {
                return AgentResult {
                    agent_name: spec.name.clone(),
                    success: true,
                    data: response.text(),
                    error: None,
                    tool_calls: call_log,
                    tokens_used: usage,
                };
            }

            messages.push(response.to_assistant_message());

            let mut tool_results = Vec::with_capacity(response.tool_use_blocks.len());
            for block in &response.tool_use_blocks {
                let mut input = block.input.clone();
                self.inject_workspace_id(&block.name, &mut input, ctx.tenant_id).await;
                clamp_row_limit(policy, &mut input);

                let started = Instant::now();
                let result = match evaluate(policy, &canonical_guess(&block.name), &input) {
                    decision if !decision.allowed => {
                        let reason = decision
                            .reason
                            .unwrap_or_else(|| "Not allowed".to_string());
                        // Engine reasons already carry the "Policy" prefix
                        // for field blocks; don't stack a second one.
                        let message = if reason.starts_with("Policy") {
                            reason
                        } else {
                            format!("Policy blocked: {}", reason)
                        };
                        json!({"error": message})
                    }
                    _ => {
                        let raw = self.dispatcher.execute(&block.name, input.clone(), ctx).await;
                        redact_output(policy, raw)
                    }
                };
                let duration_ms = started.elapsed().as_millis() as u64;

                let rendered = result.to_string();
                call_log.push(ToolCallRecord {
                    step,
                    agent: spec.name.clone(),
                    tool: block.name.clone(),
                    params: input,
                    result_summary: ToolCallRecord::summarize(&rendered),
                    duration_ms,
                });
                tool_results.push((block.id.clone(), rendered));
            }

            messages.push(ChatMessage::tool_results(tool_results));
        }

        // Loop exhausted: force a user-facing answer with no tools.
        info!(agent = %spec.name, max_steps = spec.max_steps, "agent loop exhausted, forcing final response");
        let request = ChatRequest {
            model: model.to_string(),
            max_tokens: spec.max_tokens,
            system: spec.system_prompt.clone(),
            messages,
            tools: Vec::new(),
        };
        match self.call_with_retry(&request).await {
            Ok(response) => {
                usage.add(response.usage);
                AgentResult {
                    agent_name: spec.name.clone(),
                    success: true,
                    data: response.text(),
                    error: None,
                    tool_calls: call_log,
                    tokens_used: usage,
                }
            }
            Err(message) => {
                let mut result = AgentResult::failure(&spec.name, message);
                result.tool_calls = call_log;
                result.tokens_used = usage;
                result
            }
        }
    }

    /// One retry for transient provider failures; everything else fails
    /// the agent immediately.
    async fn call_with_retry(&self, request: &ChatRequest) -> Result<LlmResponse, String> {
        match self.llm.create_message(request).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_transient() => {
                warn!(error = %err, "transient llm failure, retrying once");
                self.llm
                    .create_message(request)
                    .await
                    .map_err(|e| e.to_string())
            }
            Err(err) => Err(err.to_string()),
        }
    }

    /// Workspace tools need a workspace_id; when the model omitted it or
    /// supplied something that is not a UUID, fill in the tenant's most
    /// recent active workspace.
    async fn inject_workspace_id(&self, tool_name: &str, input: &mut Value, tenant_id: Uuid) {
        if !tool_name.starts_with("workspace_") {
            return;
        }
        let supplied = input
            .get("workspace_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        let valid = supplied
            .as_deref()
            .map(|s| Uuid::try_parse(s).is_ok())
            .unwrap_or(false);
        if valid {
            return;
        }

        match self.workspaces.most_recent_active_workspace(tenant_id).await {
            Ok(Some(workspace)) => {
                if let Value::Object(map) = input {
                    map.insert(
                        "workspace_id".to_string(),
                        Value::String(workspace.id.to_string()),
                    );
                }
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "default workspace lookup failed"),
        }
    }
}

/// A policy's `max_rows_per_query` caps the model-supplied `limit`
/// before the governor applies the descriptor's own cap.
fn clamp_row_limit(policy: Option<&PolicyProfile>, input: &mut Value) {
    let Some(max_rows) = policy.and_then(|p| p.max_rows_per_query) else {
        return;
    };
    let Value::Object(map) = input else {
        return;
    };
    let supplied = map.get("limit").and_then(Value::as_u64);
    match supplied {
        Some(limit) if limit > max_rows => {
            map.insert("limit".to_string(), json!(max_rows));
        }
        _ => {}
    }
}

/// The policy engine matches on canonical dotted names; tool-use blocks
/// carry sanitized names. The catalog's sanitization replaces only dots,
/// so restoring the first underscore of known prefixes is enough.
fn canonical_guess(sanitized: &str) -> String {
    for prefix in ["netsuite", "data", "recon", "report", "schedule", "workspace"] {
        let with_prefix = format!("{}_", prefix);
        if let Some(rest) = sanitized.strip_prefix(&with_prefix) {
            return format!("{}.{}", prefix, rest);
        }
    }
    sanitized.to_string()
}

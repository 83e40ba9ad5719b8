// function_call.rs — Codec for the function-call provider family.
//
// This family carries tool invocations as a `tool_calls` array on the
// assistant message with stringified JSON arguments, and tool results as
// separate `role: "tool"` messages keyed by `tool_call_id`. The system
// prompt is the first message and tool definitions nest under
// `{"type": "function", "function": {...}}`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::adapter::LlmAdapter;
use crate::error::LlmError;
use crate::transport::ProviderTransport;
use crate::types::{ChatRequest, ContentBlock, LlmResponse, Role, TokenUsage, ToolUseBlock};

/// Adapter for providers speaking the function-call wire shape.
pub struct FunctionCallAdapter<T: ProviderTransport> {
    transport: T,
}

impl<T: ProviderTransport> FunctionCallAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn build_body(&self, request: &ChatRequest) -> Value {
        let mut messages = Vec::new();
        if !request.system.is_empty() {
            messages.push(json!({"role": "system", "content": request.system}));
        }

        for message in &request.messages {
            match message.role {
                Role::Assistant => {
                    let mut text_parts = Vec::new();
                    let mut tool_calls = Vec::new();
                    for block in &message.content {
                        match block {
                            ContentBlock::Text { text } => text_parts.push(text.clone()),
                            ContentBlock::ToolUse { id, name, input } => {
                                tool_calls.push(json!({
                                    "id": id,
                                    "type": "function",
                                    "function": {
                                        "name": name,
                                        "arguments": input.to_string(),
                                    },
                                }));
                            }
                            ContentBlock::ToolResult { .. } => {}
                        }
                    }
                    let mut entry = json!({
                        "role": "assistant",
                        "content": if text_parts.is_empty() {
                            Value::Null
                        } else {
                            Value::String(text_parts.join("\n"))
                        },
                    });
                    if !tool_calls.is_empty() {
                        entry["tool_calls"] = Value::Array(tool_calls);
                    }
                    messages.push(entry);
                }
                Role::User => {
                    // Tool results become their own tool-role messages;
                    // any plain text stays a user message.
                    let mut text_parts = Vec::new();
                    for block in &message.content {
                        match block {
                            ContentBlock::Text { text } => text_parts.push(text.clone()),
                            ContentBlock::ToolResult {
                                tool_use_id,
                                content,
                            } => messages.push(json!({
                                "role": "tool",
                                "tool_call_id": tool_use_id,
                                "content": content,
                            })),
                            ContentBlock::ToolUse { .. } => {}
                        }
                    }
                    if !text_parts.is_empty() {
                        messages.push(json!({
                            "role": "user",
                            "content": text_parts.join("\n"),
                        }));
                    }
                }
            }
        }

        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": messages,
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(
                request
                    .tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": tool.name,
                                "description": tool.description,
                                "parameters": tool.input_schema,
                            },
                        })
                    })
                    .collect(),
            );
        }
        body
    }

    fn parse_response(&self, body: &Value) -> Result<LlmResponse, LlmError> {
        let message = body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| LlmError::Malformed("missing choices[0].message".to_string()))?;

        let mut response = LlmResponse::default();

        if let Some(text) = message.get("content").and_then(Value::as_str) {
            if !text.is_empty() {
                response.text_blocks.push(text.to_string());
            }
        }

        if let Some(tool_calls) = message.get("tool_calls").and_then(Value::as_array) {
            for call in tool_calls {
                let function = call.get("function").cloned().unwrap_or(Value::Null);
                let arguments = function
                    .get("arguments")
                    .and_then(Value::as_str)
                    .unwrap_or("{}");
                let input = serde_json::from_str(arguments).map_err(|e| {
                    LlmError::Malformed(format!("unparseable function arguments: {}", e))
                })?;
                response.tool_use_blocks.push(ToolUseBlock {
                    id: call
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    name: function
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    input,
                });
            }
        }

        if let Some(usage) = body.get("usage") {
            response.usage = TokenUsage {
                input_tokens: usage
                    .get("prompt_tokens")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                output_tokens: usage
                    .get("completion_tokens")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
            };
        }

        Ok(response)
    }
}

#[async_trait]
impl<T: ProviderTransport + 'static> LlmAdapter for FunctionCallAdapter<T> {
    async fn create_message(&self, request: &ChatRequest) -> Result<LlmResponse, LlmError> {
        let body = self.build_body(request);
        let reply = self.transport.send(body).await?;
        self.parse_response(&reply)
    }
}

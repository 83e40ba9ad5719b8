// typed_function.rs — Codec for the typed-function provider family.
//
// This family has no tool-call ids on the wire: invocations are
// `functionCall` parts and results are `functionResponse` parts keyed by
// function name. Outbound, canonical tool_use ids are resolved back to
// names by scanning the conversation; inbound, synthetic ids are minted
// so the rest of the system keeps its id-keyed bookkeeping.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::adapter::LlmAdapter;
use crate::error::LlmError;
use crate::transport::ProviderTransport;
use crate::types::{ChatRequest, ContentBlock, LlmResponse, Role, TokenUsage, ToolUseBlock};

/// Adapter for providers speaking typed function declarations.
pub struct TypedFunctionAdapter<T: ProviderTransport> {
    transport: T,
}

impl<T: ProviderTransport> TypedFunctionAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn build_body(&self, request: &ChatRequest) -> Value {
        // Map tool_use ids to function names for result attribution.
        let mut id_to_name: HashMap<&str, &str> = HashMap::new();
        for message in &request.messages {
            for block in &message.content {
                if let ContentBlock::ToolUse { id, name, .. } = block {
                    id_to_name.insert(id, name);
                }
            }
        }

        let contents: Vec<Value> = request
            .messages
            .iter()
            .map(|message| {
                let parts: Vec<Value> = message
                    .content
                    .iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => json!({"text": text}),
                        ContentBlock::ToolUse { name, input, .. } => json!({
                            "functionCall": {"name": name, "args": input},
                        }),
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                        } => {
                            let name = id_to_name.get(tool_use_id.as_str()).copied().unwrap_or("");
                            json!({
                                "functionResponse": {
                                    "name": name,
                                    "response": {"content": content},
                                },
                            })
                        }
                    })
                    .collect();
                json!({
                    "role": match message.role {
                        Role::Assistant => "model",
                        Role::User => "user",
                    },
                    "parts": parts,
                })
            })
            .collect();

        let mut body = json!({
            "systemInstruction": {"parts": [{"text": request.system}]},
            "contents": contents,
            "generationConfig": {"maxOutputTokens": request.max_tokens},
        });
        if !request.tools.is_empty() {
            body["tools"] = json!([{
                "functionDeclarations": request
                    .tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.input_schema,
                        })
                    })
                    .collect::<Vec<_>>(),
            }]);
        }
        body
    }

    fn parse_response(&self, body: &Value) -> Result<LlmResponse, LlmError> {
        let parts = body
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .ok_or_else(|| LlmError::Malformed("missing candidates[0].content.parts".to_string()))?;

        let mut response = LlmResponse::default();
        for (index, part) in parts.iter().enumerate() {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                response.text_blocks.push(text.to_string());
            } else if let Some(call) = part.get("functionCall") {
                let name = call
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                response.tool_use_blocks.push(ToolUseBlock {
                    // No wire id; mint one stable within this response.
                    id: format!("fncall_{}_{}", index, name),
                    name,
                    input: call.get("args").cloned().unwrap_or(json!({})),
                });
            }
        }

        if let Some(usage) = body.get("usageMetadata") {
            response.usage = TokenUsage {
                input_tokens: usage
                    .get("promptTokenCount")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                output_tokens: usage
                    .get("candidatesTokenCount")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
            };
        }

        Ok(response)
    }
}

#[async_trait]
impl<T: ProviderTransport + 'static> LlmAdapter for TypedFunctionAdapter<T> {
    async fn create_message(&self, request: &ChatRequest) -> Result<LlmResponse, LlmError> {
        let body = self.build_body(request);
        let reply = self.transport.send(body).await?;
        self.parse_response(&reply)
    }
}

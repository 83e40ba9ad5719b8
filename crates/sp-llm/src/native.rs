// native.rs — Codec for the native-tool-use provider family.
//
// This family speaks content-block messages: text, tool_use, and
// tool_result blocks travel inside a single content array, the system
// prompt is a top-level field, and tool definitions carry `input_schema`.
// Streaming delivers typed events; text deltas are forwarded as they
// arrive and tool-use inputs are accumulated from partial JSON fragments.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::{json, Map, Value};

use crate::adapter::LlmAdapter;
use crate::error::LlmError;
use crate::transport::ProviderTransport;
use crate::types::{
    ChatRequest, ContentBlock, LlmResponse, Role, StreamEvent, TokenUsage, ToolUseBlock,
};

/// Adapter for providers with first-class tool-use content blocks.
pub struct NativeToolAdapter<T: ProviderTransport> {
    transport: T,
}

impl<T: ProviderTransport> NativeToolAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn build_body(&self, request: &ChatRequest, stream: bool) -> Value {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|message| {
                let content: Vec<Value> = message
                    .content
                    .iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => json!({"type": "text", "text": text}),
                        ContentBlock::ToolUse { id, name, input } => json!({
                            "type": "tool_use",
                            "id": id,
                            "name": name,
                            "input": input,
                        }),
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                        } => json!({
                            "type": "tool_result",
                            "tool_use_id": tool_use_id,
                            "content": content,
                        }),
                    })
                    .collect();
                json!({
                    "role": match message.role {
                        Role::Assistant => "assistant",
                        Role::User => "user",
                    },
                    "content": content,
                })
            })
            .collect();

        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": messages,
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(
                request
                    .tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "name": tool.name,
                            "description": tool.description,
                            "input_schema": tool.input_schema,
                        })
                    })
                    .collect(),
            );
        }
        if stream {
            body["stream"] = json!(true);
        }
        body
    }

    fn parse_response(&self, body: &Value) -> Result<LlmResponse, LlmError> {
        let content = body
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| LlmError::Malformed("missing content array".to_string()))?;

        let mut response = LlmResponse::default();
        for block in content {
            match block.get("type").and_then(Value::as_str) {
                Some("text") => {
                    if let Some(text) = block.get("text").and_then(Value::as_str) {
                        response.text_blocks.push(text.to_string());
                    }
                }
                Some("tool_use") => {
                    response.tool_use_blocks.push(ToolUseBlock {
                        id: block
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        name: block
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        input: block.get("input").cloned().unwrap_or(Value::Null),
                    });
                }
                _ => {}
            }
        }

        response.usage = parse_usage(body.get("usage"));
        Ok(response)
    }
}

fn parse_usage(usage: Option<&Value>) -> TokenUsage {
    let Some(usage) = usage else {
        return TokenUsage::default();
    };
    TokenUsage {
        input_tokens: usage
            .get("input_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        output_tokens: usage
            .get("output_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    }
}

/// Accumulates streamed events into the terminal response.
#[derive(Default)]
struct StreamState {
    text_blocks: Vec<String>,
    tool_use_blocks: Vec<ToolUseBlock>,
    usage: TokenUsage,
}

#[async_trait]
impl<T: ProviderTransport + 'static> LlmAdapter for NativeToolAdapter<T> {
    async fn create_message(&self, request: &ChatRequest) -> Result<LlmResponse, LlmError> {
        let body = self.build_body(request, false);
        let reply = self.transport.send(body).await?;
        self.parse_response(&reply)
    }

    async fn stream_message(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent, LlmError>>, LlmError> {
        let body = self.build_body(request, true);
        let mut events = self.transport.stream(body).await?;

        let stream = async_stream::stream! {
            let mut state = StreamState::default();
            let mut current_text = String::new();
            let mut partial_json = String::new();
            let mut open_tool: Option<ToolUseBlock> = None;

            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                };

                match event.get("type").and_then(Value::as_str) {
                    Some("content_block_start") => {
                        let block = event.get("content_block").cloned().unwrap_or(Value::Null);
                        if block.get("type").and_then(Value::as_str) == Some("tool_use") {
                            open_tool = Some(ToolUseBlock {
                                id: block.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
                                name: block.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                                input: Value::Null,
                            });
                            partial_json.clear();
                        }
                    }
                    Some("content_block_delta") => {
                        let delta = event.get("delta").cloned().unwrap_or(Value::Null);
                        match delta.get("type").and_then(Value::as_str) {
                            Some("text_delta") => {
                                if let Some(text) = delta.get("text").and_then(Value::as_str) {
                                    current_text.push_str(text);
                                    yield Ok(StreamEvent::Text(text.to_string()));
                                }
                            }
                            Some("input_json_delta") => {
                                if let Some(fragment) = delta.get("partial_json").and_then(Value::as_str) {
                                    partial_json.push_str(fragment);
                                }
                            }
                            _ => {}
                        }
                    }
                    Some("content_block_stop") => {
                        if let Some(mut tool) = open_tool.take() {
                            tool.input = serde_json::from_str(&partial_json)
                                .unwrap_or(Value::Object(Map::new()));
                            state.tool_use_blocks.push(tool);
                            partial_json.clear();
                        } else if !current_text.is_empty() {
                            state.text_blocks.push(std::mem::take(&mut current_text));
                        }
                    }
                    Some("message_delta") => {
                        let usage = parse_usage(event.get("usage"));
                        state.usage.output_tokens += usage.output_tokens;
                    }
                    Some("message_start") => {
                        let usage = parse_usage(
                            event.get("message").and_then(|m| m.get("usage")),
                        );
                        state.usage.input_tokens += usage.input_tokens;
                    }
                    _ => {}
                }
            }

            if !current_text.is_empty() {
                state.text_blocks.push(current_text);
            }

            yield Ok(StreamEvent::Response(LlmResponse {
                text_blocks: state.text_blocks,
                tool_use_blocks: state.tool_use_blocks,
                usage: state.usage,
            }));
        };

        Ok(stream.boxed())
    }
}

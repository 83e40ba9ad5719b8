// types.rs — Canonical chat types shared by all provider codecs.
//
// Tool inputs and results are the two unavoidably dynamic boundaries, so
// they stay as serde_json::Value here; everything else is typed. Codecs
// translate these shapes to provider wire formats and back, preserving
// tool-use ids, names, and parsed JSON arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message author. System text travels as a request field, not a role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One block inside a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// A single canonical message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// A user message carrying tool results back to the model.
    pub fn tool_results(results: Vec<(String, String)>) -> Self {
        Self {
            role: Role::User,
            content: results
                .into_iter()
                .map(|(tool_use_id, content)| ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                })
                .collect(),
        }
    }
}

/// A tool offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub input_schema: Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolUseBlock {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Token accounting for one call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A complete model response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text_blocks: Vec<String>,
    pub tool_use_blocks: Vec<ToolUseBlock>,
    pub usage: TokenUsage,
}

impl LlmResponse {
    /// All text blocks joined with newlines.
    pub fn text(&self) -> String {
        self.text_blocks.join("\n")
    }

    /// Rebuild the assistant message for the conversation transcript.
    pub fn to_assistant_message(&self) -> ChatMessage {
        let mut content: Vec<ContentBlock> = self
            .text_blocks
            .iter()
            .map(|text| ContentBlock::Text { text: text.clone() })
            .collect();
        content.extend(self.tool_use_blocks.iter().map(|block| ContentBlock::ToolUse {
            id: block.id.clone(),
            name: block.name.clone(),
            input: block.input.clone(),
        }));
        ChatMessage::assistant(content)
    }
}

/// One event from a streaming call. The terminal `Response` always
/// arrives last and carries the authoritative full content.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Text(String),
    Response(LlmResponse),
}

/// A canonical request to any provider family.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSpec>,
}

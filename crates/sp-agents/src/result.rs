// result.rs — Agent run results and the tool-call log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sp_llm::TokenUsage;

/// Cap on stored result summaries in the call log.
pub const MAX_RESULT_SUMMARY_CHARS: usize = 500;

/// One executed tool call, as recorded in the log the coordinator
/// returns with the final message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub step: usize,
    pub agent: String,
    pub tool: String,
    pub params: Value,
    pub result_summary: String,
    pub duration_ms: u64,
}

impl ToolCallRecord {
    /// Truncate a raw result into the stored summary.
    pub fn summarize(raw: &str) -> String {
        raw.chars().take(MAX_RESULT_SUMMARY_CHARS).collect()
    }
}

/// Outcome of one specialist run.
#[derive(Debug, Clone, Default)]
pub struct AgentResult {
    pub agent_name: String,
    pub success: bool,
    /// Final text output when successful.
    pub data: String,
    pub error: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub tokens_used: TokenUsage,
}

impl AgentResult {
    pub fn failure(agent_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

// spec.rs — The AgentSpec parameterizing one specialist.

use sp_llm::ToolSpec;

/// Everything that distinguishes one specialist from another: its name,
/// system prompt, tool subset, and step bound.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub system_prompt: String,
    /// Tools offered to this specialist, already in sanitized-name form.
    pub tools: Vec<ToolSpec>,
    pub max_steps: usize,
    pub max_tokens: u32,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
            max_steps: 3,
            max_tokens: 16_384,
        }
    }

    /// Set the tool subset and return self (builder pattern).
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

// config.rs — CLI configuration.
//
// suitepilot.toml carries the model identifiers, the agent token budget,
// the assertion table allowlist, and the local audit log path. A missing
// file yields the defaults so `sp tools` and `sp route` work anywhere.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration loaded from suitepilot.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Model used by specialists.
    pub specialist_model: String,
    /// Cheap model for planning and tie-breaks.
    pub planner_model: String,
    /// Model for synthesis.
    pub synthesis_model: String,
    /// Output-token budget shared by a turn's agent calls.
    pub agent_token_budget: u64,
    /// Tables assertion queries may reference.
    pub assertion_allowed_tables: Vec<String>,
    /// Local JSONL audit log path.
    pub audit_log: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            specialist_model: "specialist-small".to_string(),
            planner_model: "planner-small".to_string(),
            synthesis_model: "synthesis-large".to_string(),
            agent_token_budget: 60_000,
            assertion_allowed_tables: vec![
                "transaction".to_string(),
                "transactionline".to_string(),
                "customer".to_string(),
                "item".to_string(),
            ],
            audit_log: PathBuf::from(".suitepilot/audit.jsonl"),
        }
    }
}

impl CliConfig {
    /// Load from a TOML file, or fall back to defaults when absent.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

// descriptor.rs — Tool descriptors and the startup catalog.
//
// Descriptors are immutable, in-process metadata recreated at startup.
// The catalog below is the complete local tool surface: allowlisted
// parameter keys, timeouts, per-minute rate limits, and the entitlement
// class each tool requires.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};

use crate::sanitize::sanitize_tool_name;

/// Immutable metadata for one local tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Stable dot-separated canonical name.
    pub name: &'static str,
    pub description: &'static str,
    /// Parameter keys accepted by the tool; everything else is dropped.
    pub allowed_params: &'static [&'static str],
    /// Injected when a `limit` parameter is absent.
    pub default_limit: Option<u64>,
    /// Cap applied to a supplied `limit` parameter.
    pub max_limit: Option<u64>,
    pub timeout: Option<Duration>,
    pub rate_limit_per_minute: u32,
    /// Entitlement class required to call this tool, if any.
    pub requires_entitlement: Option<&'static str>,
}

impl ToolDescriptor {
    /// Whether this tool's schema carries a query-shaped parameter.
    pub fn has_query_param(&self) -> bool {
        self.allowed_params.contains(&"query")
    }

    /// JSON Schema for the LLM-facing tool definition: every allowlisted
    /// key is a permissive property, nothing is required.
    pub fn input_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .allowed_params
            .iter()
            .map(|key| ((*key).to_string(), json!({})))
            .collect();
        json!({
            "type": "object",
            "properties": properties,
        })
    }
}

const ENT_MCP: Option<&str> = Some("mcp_tools");
const ENT_WORKSPACE: Option<&str> = Some("workspace");

/// The complete local tool table.
pub const TOOL_TABLE: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "health",
        description: "Service health check",
        allowed_params: &[],
        default_limit: None,
        max_limit: None,
        timeout: None,
        rate_limit_per_minute: 60,
        requires_entitlement: None,
    },
    ToolDescriptor {
        name: "netsuite.suiteql",
        description: "Execute a read-only SuiteQL query",
        allowed_params: &["query", "limit"],
        default_limit: Some(100),
        max_limit: Some(1000),
        timeout: Some(Duration::from_secs(30)),
        rate_limit_per_minute: 30,
        requires_entitlement: ENT_MCP,
    },
    ToolDescriptor {
        name: "netsuite.suiteql_stub",
        description: "Execute a SuiteQL query against canned fixtures",
        allowed_params: &["query", "limit"],
        default_limit: Some(100),
        max_limit: Some(1000),
        timeout: Some(Duration::from_secs(30)),
        rate_limit_per_minute: 30,
        requires_entitlement: ENT_MCP,
    },
    ToolDescriptor {
        name: "netsuite.connectivity",
        description: "Verify the NetSuite connection",
        allowed_params: &[],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(15)),
        rate_limit_per_minute: 10,
        requires_entitlement: ENT_MCP,
    },
    ToolDescriptor {
        name: "data.sample_table_read",
        description: "Sample rows from an allowed table",
        allowed_params: &["table_name", "limit"],
        default_limit: Some(100),
        max_limit: Some(1000),
        timeout: Some(Duration::from_secs(10)),
        rate_limit_per_minute: 30,
        requires_entitlement: ENT_MCP,
    },
    ToolDescriptor {
        name: "recon.run",
        description: "Run a payout reconciliation pass",
        allowed_params: &["date_from", "date_to", "payout_ids"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(120)),
        rate_limit_per_minute: 10,
        requires_entitlement: ENT_MCP,
    },
    ToolDescriptor {
        name: "report.export",
        description: "Export a report",
        allowed_params: &["report_type", "format", "filters"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(60)),
        rate_limit_per_minute: 20,
        requires_entitlement: ENT_MCP,
    },
    ToolDescriptor {
        name: "schedule.create",
        description: "Create a scheduled job",
        allowed_params: &["name", "schedule_type", "cron", "params"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(10)),
        rate_limit_per_minute: 10,
        requires_entitlement: ENT_MCP,
    },
    ToolDescriptor {
        name: "schedule.list",
        description: "List scheduled jobs",
        allowed_params: &[],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(10)),
        rate_limit_per_minute: 30,
        requires_entitlement: ENT_MCP,
    },
    ToolDescriptor {
        name: "schedule.run",
        description: "Trigger a scheduled job now",
        allowed_params: &["schedule_id"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(30)),
        rate_limit_per_minute: 10,
        requires_entitlement: ENT_MCP,
    },
    ToolDescriptor {
        name: "workspace.list_files",
        description: "List files in a workspace",
        allowed_params: &["workspace_id", "directory", "recursive", "limit"],
        default_limit: Some(100),
        max_limit: Some(1000),
        timeout: Some(Duration::from_secs(10)),
        rate_limit_per_minute: 60,
        requires_entitlement: ENT_WORKSPACE,
    },
    ToolDescriptor {
        name: "workspace.read_file",
        description: "Read a workspace file",
        allowed_params: &["workspace_id", "file_id", "line_start", "line_end"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(10)),
        rate_limit_per_minute: 120,
        requires_entitlement: ENT_WORKSPACE,
    },
    ToolDescriptor {
        name: "workspace.search",
        description: "Search workspace files",
        allowed_params: &["workspace_id", "query", "search_type", "limit"],
        default_limit: Some(100),
        max_limit: Some(1000),
        timeout: Some(Duration::from_secs(15)),
        rate_limit_per_minute: 30,
        requires_entitlement: ENT_WORKSPACE,
    },
    ToolDescriptor {
        name: "workspace.propose_patch",
        description: "Propose a file change as a draft changeset",
        allowed_params: &["workspace_id", "file_path", "unified_diff", "title", "rationale"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(10)),
        rate_limit_per_minute: 10,
        requires_entitlement: ENT_WORKSPACE,
    },
    ToolDescriptor {
        name: "workspace.apply_patch",
        description: "Apply an approved changeset",
        allowed_params: &["changeset_id"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(30)),
        rate_limit_per_minute: 5,
        requires_entitlement: ENT_WORKSPACE,
    },
    ToolDescriptor {
        name: "workspace.run_validate",
        description: "Run SDF validation in a sandbox",
        allowed_params: &["workspace_id", "changeset_id"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(60)),
        rate_limit_per_minute: 5,
        requires_entitlement: ENT_WORKSPACE,
    },
    ToolDescriptor {
        name: "workspace.run_unit_tests",
        description: "Run unit tests in a sandbox",
        allowed_params: &["workspace_id", "changeset_id"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(120)),
        rate_limit_per_minute: 5,
        requires_entitlement: ENT_WORKSPACE,
    },
    ToolDescriptor {
        name: "workspace.run_suiteql_assertions",
        description: "Run a SuiteQL assertion batch",
        allowed_params: &["changeset_id", "assertions"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(300)),
        rate_limit_per_minute: 5,
        requires_entitlement: ENT_WORKSPACE,
    },
    ToolDescriptor {
        name: "workspace.deploy_sandbox",
        description: "Deploy a gated changeset to the sandbox account",
        allowed_params: &["changeset_id", "override_reason", "require_assertions"],
        default_limit: None,
        max_limit: None,
        timeout: Some(Duration::from_secs(600)),
        rate_limit_per_minute: 2,
        requires_entitlement: ENT_WORKSPACE,
    },
];

/// Lookup structure over the tool table, built once at startup.
pub struct ToolCatalog {
    by_name: HashMap<&'static str, &'static ToolDescriptor>,
    by_sanitized: HashMap<String, &'static ToolDescriptor>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        let mut by_name = HashMap::new();
        let mut by_sanitized = HashMap::new();
        for descriptor in TOOL_TABLE {
            by_name.insert(descriptor.name, descriptor);
            by_sanitized.insert(sanitize_tool_name(descriptor.name), descriptor);
        }
        Self {
            by_name,
            by_sanitized,
        }
    }

    pub fn get(&self, canonical_name: &str) -> Option<&'static ToolDescriptor> {
        self.by_name.get(canonical_name).copied()
    }

    /// Resolve the sanitized form the LLM sees back to its descriptor.
    pub fn resolve_sanitized(&self, sanitized: &str) -> Option<&'static ToolDescriptor> {
        self.by_sanitized.get(sanitized).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static ToolDescriptor> + '_ {
        TOOL_TABLE.iter()
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

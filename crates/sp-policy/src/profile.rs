// profile.rs — The PolicyProfile entity.
//
// One tenant can accumulate many profile versions but at most one is
// active. Onboarding can lock the active profile; a locked profile rejects
// every mutation until an administrator unlocks it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wildcard entry meaning "all record types permitted".
pub const RECORD_TYPE_WILDCARD: &str = "*";

/// A per-tenant ordered rule set gating tool calls and redacting outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyProfile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,

    /// Monotonic version; each new profile for a tenant increments it.
    pub version: u32,

    /// Whether this is the tenant's single active profile.
    pub is_active: bool,

    /// Deny every mutating tool outright.
    pub read_only_mode: bool,

    /// Cap on the `limit` parameter injected into query tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows_per_query: Option<u64>,

    /// Require a row-limit clause in every query-shaped parameter.
    pub require_row_limit: bool,

    /// Field names that may not appear in queries and are stripped from
    /// results. Matched case-insensitively as substrings of query text.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub blocked_fields: BTreeSet<String>,

    /// Record types queries may touch. `{"*"}` (the default) allows all.
    #[serde(default = "default_record_types")]
    pub allowed_record_types: BTreeSet<String>,

    /// When set, only these tools may be called at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_allowlist: Option<BTreeSet<String>>,

    /// Locked profiles reject mutation until unlocked administratively.
    pub locked: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_record_types() -> BTreeSet<String> {
    BTreeSet::from([RECORD_TYPE_WILDCARD.to_string()])
}

impl PolicyProfile {
    /// Create a fresh, unlocked, active profile with permissive defaults.
    pub fn new(tenant_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.into(),
            version: 1,
            is_active: true,
            read_only_mode: false,
            max_rows_per_query: None,
            require_row_limit: false,
            blocked_fields: BTreeSet::new(),
            allowed_record_types: default_record_types(),
            tool_allowlist: None,
            locked: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a blocked field and return self (builder pattern).
    pub fn with_blocked_field(mut self, field: impl Into<String>) -> Self {
        self.blocked_fields.insert(field.into());
        self
    }

    /// Restrict callable tools and return self.
    pub fn with_tool_allowlist<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tool_allowlist = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    /// Require a row-limit clause on queries and return self.
    pub fn with_row_limit_required(mut self) -> Self {
        self.require_row_limit = true;
        self
    }

    /// Switch on read-only mode and return self.
    pub fn read_only(mut self) -> Self {
        self.read_only_mode = true;
        self
    }

    /// Whether every record type is permitted.
    pub fn allows_all_record_types(&self) -> bool {
        self.allowed_record_types.contains(RECORD_TYPE_WILDCARD)
    }

    /// Whether a specific record type is permitted.
    pub fn allows_record_type(&self, record_type: &str) -> bool {
        self.allows_all_record_types()
            || self
                .allowed_record_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(record_type))
    }
}

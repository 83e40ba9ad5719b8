// sanitize.rs — Tool name sanitization.
//
// LLM providers restrict tool names to alphanumerics and underscores, so
// dotted canonical names are flattened ("netsuite.suiteql" becomes
// "netsuite_suiteql"). The mapping back to canonical names goes through
// the catalog, which makes the pair a bijection over registered tools.
// External connector tools use the form `ext__<connector-hex>__<tool>`,
// truncated so the whole sanitized name never exceeds 64 bytes.

use uuid::Uuid;

/// Hard cap on sanitized tool name length.
pub const MAX_SANITIZED_NAME_BYTES: usize = 64;

const EXTERNAL_PREFIX: &str = "ext__";
const EXTERNAL_SEPARATOR: &str = "__";

/// Flatten a canonical tool name into the form the LLM sees.
pub fn sanitize_tool_name(canonical: &str) -> String {
    canonical
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// A parsed external tool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalToolName {
    pub connector_id: Uuid,
    pub tool: String,
}

/// Render an external tool name, truncating the tool part so the result
/// stays within [`MAX_SANITIZED_NAME_BYTES`].
pub fn format_external_name(connector_id: Uuid, tool: &str) -> String {
    let hex = connector_id.simple().to_string();
    let prefix = format!("{}{}{}", EXTERNAL_PREFIX, hex, EXTERNAL_SEPARATOR);
    let budget = MAX_SANITIZED_NAME_BYTES.saturating_sub(prefix.len());
    let sanitized_tool = sanitize_tool_name(tool);
    let truncated: String = sanitized_tool.chars().take(budget).collect();
    format!("{}{}", prefix, truncated)
}

/// Parse `ext__<hex>__<tool>`, returning `None` for local names.
pub fn parse_external_name(name: &str) -> Option<ExternalToolName> {
    let rest = name.strip_prefix(EXTERNAL_PREFIX)?;
    let (hex, tool) = rest.split_once(EXTERNAL_SEPARATOR)?;
    let connector_id = Uuid::try_parse(hex).ok()?;
    if tool.is_empty() {
        return None;
    }
    Some(ExternalToolName {
        connector_id,
        tool: tool.to_string(),
    })
}

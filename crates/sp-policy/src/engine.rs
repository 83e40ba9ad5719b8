// engine.rs — Policy evaluation and output redaction.
//
// A policy is consulted twice per tool call: `evaluate` gates the call
// before execution, `redact_output` strips blocked fields from the result
// afterwards. Checks short-circuit on the first failure, in a fixed order:
//
// 1. Tool allowlist (when set).
// 2. Read-only mode against mutating tools.
// 3. Blocked fields as case-insensitive substrings of query parameters.
// 4. Record-type allowlist against table/record parameters.
// 5. Row-limit requirement on query parameters.

use serde_json::Value;

use crate::profile::PolicyProfile;

/// Outcome of a pre-execution policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl PolicyDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Parameter keys that carry query text.
const QUERY_PARAM_KEYS: &[&str] = &["query"];

/// Parameter keys that name a record type or table.
const RECORD_TYPE_PARAM_KEYS: &[&str] = &["table_name", "record_type"];

/// Tools that mutate state and are denied under read-only mode.
const MUTATING_TOOLS: &[&str] = &[
    "workspace.propose_patch",
    "workspace.apply_patch",
    "workspace.deploy_sandbox",
    "schedule.create",
];

/// Row-limit clauses accepted across the supported SQL dialects.
const ROW_LIMIT_KEYWORDS: &[&str] = &["rownum", "fetch first", "fetch next", "top ", "limit"];

/// Evaluate a proposed tool call against the tenant's active policy.
///
/// A missing policy allows everything; governance-level limits still apply.
pub fn evaluate(policy: Option<&PolicyProfile>, tool_name: &str, params: &Value) -> PolicyDecision {
    let Some(policy) = policy else {
        return PolicyDecision::allow();
    };

    if let Some(allowlist) = &policy.tool_allowlist {
        if !allowlist.contains(tool_name) {
            return PolicyDecision::deny(format!("Tool '{}' not allowed by policy", tool_name));
        }
    }

    if policy.read_only_mode && MUTATING_TOOLS.contains(&tool_name) {
        return PolicyDecision::deny(format!(
            "Tool '{}' is not allowed in read-only mode",
            tool_name
        ));
    }

    let query_text = query_param(params);

    if let Some(query) = &query_text {
        let lowered = query.to_lowercase();
        for field in &policy.blocked_fields {
            if lowered.contains(&field.to_lowercase()) {
                return PolicyDecision::deny(format!(
                    "Policy blocked: field '{}' is restricted",
                    field
                ));
            }
        }
    }

    if !policy.allows_all_record_types() {
        for key in RECORD_TYPE_PARAM_KEYS {
            if let Some(record_type) = params.get(key).and_then(Value::as_str) {
                if !policy.allows_record_type(record_type) {
                    return PolicyDecision::deny(format!(
                        "Policy blocked: record type '{}' is not allowed",
                        record_type
                    ));
                }
            }
        }
    }

    if policy.require_row_limit {
        if let Some(query) = &query_text {
            if !has_row_limit(query) {
                return PolicyDecision::deny("Policy requires row limit");
            }
        }
    }

    PolicyDecision::allow()
}

/// Strip blocked-field keys from a tool result, recursively.
///
/// Lists are filtered element-wise so rows lose only the blocked columns.
/// Without a policy (or with no blocked fields) the value passes through.
pub fn redact_output(policy: Option<&PolicyProfile>, value: Value) -> Value {
    let Some(policy) = policy else {
        return value;
    };
    if policy.blocked_fields.is_empty() {
        return value;
    }
    strip_fields(policy, value)
}

fn strip_fields(policy: &PolicyProfile, value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| {
                    let lowered = key.to_lowercase();
                    !policy
                        .blocked_fields
                        .iter()
                        .any(|f| f.to_lowercase() == lowered)
                })
                .map(|(key, inner)| (key, strip_fields(policy, inner)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| strip_fields(policy, item))
                .collect(),
        ),
        other => other,
    }
}

fn query_param(params: &Value) -> Option<String> {
    QUERY_PARAM_KEYS
        .iter()
        .find_map(|key| params.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

fn has_row_limit(query: &str) -> bool {
    let lowered = query.to_lowercase();
    ROW_LIMIT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn strict_policy() -> PolicyProfile {
        PolicyProfile::new(Uuid::new_v4(), "Strict")
            .with_blocked_field("salary")
            .with_row_limit_required()
    }

    #[test]
    fn no_policy_allows_everything() {
        let decision = evaluate(None, "netsuite.suiteql", &json!({"query": "SELECT salary"}));
        assert!(decision.allowed);
    }

    #[test]
    fn tool_allowlist_denies_unlisted_tool() {
        let policy =
            PolicyProfile::new(Uuid::new_v4(), "Narrow").with_tool_allowlist(["health"]);
        let decision = evaluate(Some(&policy), "netsuite.suiteql", &json!({}));
        assert!(!decision.allowed);
        assert_eq!(
            decision.reason.as_deref(),
            Some("Tool 'netsuite.suiteql' not allowed by policy")
        );
    }

    #[test]
    fn blocked_field_denies_query() {
        let decision = evaluate(
            Some(&strict_policy()),
            "netsuite.suiteql",
            &json!({"query": "SELECT Salary FROM employee FETCH FIRST 10 ROWS ONLY"}),
        );
        assert!(!decision.allowed);
        assert_eq!(
            decision.reason.as_deref(),
            Some("Policy blocked: field 'salary' is restricted")
        );
    }

    #[test]
    fn missing_row_limit_denies_query() {
        let decision = evaluate(
            Some(&strict_policy()),
            "netsuite.suiteql",
            &json!({"query": "SELECT id FROM transaction"}),
        );
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("Policy requires row limit"));
    }

    #[test]
    fn row_limit_clauses_are_recognized() {
        let policy = PolicyProfile::new(Uuid::new_v4(), "P").with_row_limit_required();
        for query in [
            "SELECT id FROM transaction WHERE ROWNUM <= 10",
            "SELECT id FROM transaction FETCH FIRST 5 ROWS ONLY",
            "SELECT id FROM transaction FETCH NEXT 5 ROWS ONLY",
            "select id from transaction limit 10",
        ] {
            let decision = evaluate(Some(&policy), "netsuite.suiteql", &json!({"query": query}));
            assert!(decision.allowed, "expected allow for: {}", query);
        }
    }

    #[test]
    fn read_only_mode_denies_mutating_tools() {
        let policy = PolicyProfile::new(Uuid::new_v4(), "RO").read_only();
        let decision = evaluate(Some(&policy), "workspace.apply_patch", &json!({}));
        assert!(!decision.allowed);

        let decision = evaluate(Some(&policy), "workspace.read_file", &json!({}));
        assert!(decision.allowed);
    }

    #[test]
    fn record_type_allowlist_checked() {
        let mut policy = PolicyProfile::new(Uuid::new_v4(), "P");
        policy.allowed_record_types = ["transaction".to_string()].into();
        let decision = evaluate(
            Some(&policy),
            "data.sample_table_read",
            &json!({"table_name": "employee"}),
        );
        assert!(!decision.allowed);
    }

    #[test]
    fn redact_strips_blocked_fields_recursively() {
        let policy = strict_policy();
        let redacted = redact_output(
            Some(&policy),
            json!({
                "rows": [
                    {"name": "A", "salary": 100},
                    {"name": "B", "salary": 200}
                ],
                "salary": 300
            }),
        );
        assert_eq!(
            redacted,
            json!({"rows": [{"name": "A"}, {"name": "B"}]})
        );
    }

    #[test]
    fn redact_without_policy_passes_through() {
        let value = json!({"salary": 1});
        assert_eq!(redact_output(None, value.clone()), value);
    }

    #[test]
    fn redact_is_idempotent() {
        let policy = strict_policy();
        let once = redact_output(Some(&policy), json!({"rows": [{"salary": 1, "id": 2}]}));
        let twice = redact_output(Some(&policy), once.clone());
        assert_eq!(once, twice);
    }
}

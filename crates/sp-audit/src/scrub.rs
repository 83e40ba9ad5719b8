// scrub.rs — Sensitive-key scrubbing for audit payloads.
//
// Audit payloads must never carry credential material. Keys in the
// sensitive set are removed recursively before an event is stored. This is
// distinct from tool-result redaction, which keeps the key and replaces
// the value; an audit row has no use for the key at all.

use serde_json::Value;

/// Keys whose values must never reach the audit store, compared
/// case-insensitively.
pub const SENSITIVE_KEYS: &[&str] = &["password", "secret", "token", "api_key", "credentials"];

fn is_sensitive(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&lowered.as_str())
}

/// Remove sensitive keys from a payload, recursing into nested objects
/// and arrays. Non-object values pass through unchanged.
pub fn scrub_payload(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !is_sensitive(key))
                .map(|(key, inner)| (key, scrub_payload(inner)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(scrub_payload).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_top_level_sensitive_keys() {
        let scrubbed = scrub_payload(json!({"query": "SELECT 1", "token": "abc"}));
        assert_eq!(scrubbed, json!({"query": "SELECT 1"}));
    }

    #[test]
    fn removes_nested_sensitive_keys() {
        let scrubbed = scrub_payload(json!({
            "params": {"api_key": "sk-1", "limit": 10},
            "items": [{"password": "x", "name": "a"}]
        }));
        assert_eq!(
            scrubbed,
            json!({"params": {"limit": 10}, "items": [{"name": "a"}]})
        );
    }

    #[test]
    fn key_match_is_case_insensitive() {
        let scrubbed = scrub_payload(json!({"API_KEY": "sk-1", "Secret": "s"}));
        assert_eq!(scrubbed, json!({}));
    }

    #[test]
    fn non_object_values_pass_through() {
        assert_eq!(scrub_payload(json!(42)), json!(42));
        assert_eq!(scrub_payload(json!("token")), json!("token"));
    }
}

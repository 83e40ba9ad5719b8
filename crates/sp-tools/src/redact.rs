// redact.rs — Sensitive-value redaction for tool results.
//
// Values under sensitive keys are replaced with a marker, recursing
// through nested maps. Arrays pass through unchanged: result rows are
// positional and carry no key to match against.

use serde_json::Value;

/// Replacement marker for redacted values.
pub const REDACTED: &str = "***REDACTED***";

/// Keys whose values are always redacted, compared case-insensitively.
pub const SENSITIVE_KEYS: &[&str] = &["password", "secret", "token", "api_key", "credentials"];

fn is_sensitive(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&lowered.as_str())
}

/// Redact sensitive values in a tool result.
pub fn redact_result(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| {
                    if is_sensitive(&key) {
                        (key, Value::String(REDACTED.to_string()))
                    } else {
                        (key, redact_result(inner))
                    }
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_top_level_keys() {
        let redacted = redact_result(json!({"rows": 3, "api_key": "sk-1"}));
        assert_eq!(redacted, json!({"rows": 3, "api_key": REDACTED}));
    }

    #[test]
    fn redacts_nested_maps() {
        let redacted = redact_result(json!({
            "connection": {"host": "a", "password": "hunter2"},
        }));
        assert_eq!(
            redacted,
            json!({"connection": {"host": "a", "password": REDACTED}})
        );
    }

    #[test]
    fn key_match_is_case_insensitive() {
        let redacted = redact_result(json!({"API_KEY": "sk-1", "Token": "t"}));
        assert_eq!(redacted["API_KEY"], REDACTED);
        assert_eq!(redacted["Token"], REDACTED);
    }

    #[test]
    fn arrays_pass_through() {
        let value = json!({"rows": [[1, "secret-looking"], [2, "b"]]});
        assert_eq!(redact_result(value.clone()), value);
    }

    #[test]
    fn redaction_is_idempotent() {
        let input = json!({"secret": "x", "nested": {"token": "y", "keep": 1}});
        let once = redact_result(input);
        let twice = redact_result(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn original_values_do_not_survive() {
        let redacted = redact_result(json!({"credentials": {"user": "u", "password": "deep"}}));
        // A sensitive key's whole value is replaced, nested or not.
        assert_eq!(redacted["credentials"], REDACTED);
        assert!(!redacted.to_string().contains("deep"));
    }
}

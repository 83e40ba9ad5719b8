// assertion.rs — Assertion definitions and batch validation.
//
// Assertions arrive as JSON from the workspace.run_suiteql_assertions
// tool. Validation happens before any query executes: names and queries
// must be non-empty, the expected type and operator must be known, and
// `between` requires its upper bound.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AssertError;

/// Maximum assertions in one batch.
pub const MAX_ASSERTIONS_PER_RUN: usize = 50;

/// Row cap applied to every assertion query.
pub const MAX_QUERY_LIMIT: u32 = 100;

/// Per-query timeout in seconds.
pub const QUERY_TIMEOUT_SECS: u64 = 30;

/// What aspect of the result the assertion inspects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedType {
    RowCount,
    Scalar,
    NoRows,
}

/// Comparison operator applied to the observed value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
}

impl Default for Operator {
    fn default() -> Self {
        Operator::Eq
    }
}

/// The expected condition for one assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expected {
    #[serde(rename = "type")]
    pub expect_type: ExpectedType,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Upper bound for `between`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<Value>,
}

/// One named query plus its expected condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    pub name: String,
    pub query: String,
    pub expected: Expected,
}

/// Terminal outcome of one assertion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssertionStatus {
    Passed,
    Failed,
    Error,
}

/// Validate a single assertion definition.
pub fn validate_assertion(assertion: &Assertion) -> Result<(), AssertError> {
    if assertion.name.trim().is_empty() {
        return Err(AssertError::InvalidAssertion(
            "assertion must have a 'name'".to_string(),
        ));
    }
    if assertion.query.trim().is_empty() {
        return Err(AssertError::InvalidAssertion(format!(
            "assertion '{}' must have a 'query'",
            assertion.name
        )));
    }
    if assertion.expected.operator == Operator::Between && assertion.expected.value2.is_none() {
        return Err(AssertError::InvalidAssertion(format!(
            "assertion '{}': 'between' operator requires 'value2'",
            assertion.name
        )));
    }
    Ok(())
}

/// Validate every assertion in a batch plus the batch bounds.
pub fn validate_assertions(assertions: &[Assertion]) -> Result<(), AssertError> {
    if assertions.is_empty() {
        return Err(AssertError::InvalidBatch(
            "at least one assertion is required".to_string(),
        ));
    }
    if assertions.len() > MAX_ASSERTIONS_PER_RUN {
        return Err(AssertError::InvalidBatch(format!(
            "maximum {} assertions per run",
            MAX_ASSERTIONS_PER_RUN
        )));
    }
    for assertion in assertions {
        validate_assertion(assertion)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assertion(name: &str, operator: Operator, value2: Option<Value>) -> Assertion {
        Assertion {
            name: name.to_string(),
            query: "SELECT COUNT(*) FROM transaction".to_string(),
            expected: Expected {
                expect_type: ExpectedType::RowCount,
                operator,
                value: Some(json!(1)),
                value2,
            },
        }
    }

    #[test]
    fn valid_assertion_passes() {
        assert!(validate_assertion(&assertion("a", Operator::Eq, None)).is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        let a = assertion("  ", Operator::Eq, None);
        assert!(validate_assertion(&a).is_err());
    }

    #[test]
    fn empty_query_rejected() {
        let mut a = assertion("a", Operator::Eq, None);
        a.query = String::new();
        assert!(validate_assertion(&a).is_err());
    }

    #[test]
    fn between_requires_value2() {
        assert!(validate_assertion(&assertion("a", Operator::Between, None)).is_err());
        assert!(validate_assertion(&assertion("a", Operator::Between, Some(json!(5)))).is_ok());
    }

    #[test]
    fn batch_bounds_enforced() {
        assert!(validate_assertions(&[]).is_err());

        let too_many: Vec<Assertion> = (0..=MAX_ASSERTIONS_PER_RUN)
            .map(|i| assertion(&format!("a{}", i), Operator::Eq, None))
            .collect();
        assert!(validate_assertions(&too_many).is_err());

        let just_right: Vec<Assertion> = (0..MAX_ASSERTIONS_PER_RUN)
            .map(|i| assertion(&format!("a{}", i), Operator::Eq, None))
            .collect();
        assert!(validate_assertions(&just_right).is_ok());
    }

    #[test]
    fn expected_deserializes_with_defaults() {
        let expected: Expected =
            serde_json::from_value(json!({"type": "row_count", "value": 3})).unwrap();
        assert_eq!(expected.operator, Operator::Eq);
        assert_eq!(expected.expect_type, ExpectedType::RowCount);
    }
}

// engine.rs — Assertion batch execution and reporting.
//
// Assertions run serially: each query goes through the injected executor
// with the row cap and per-query timeout, the observed value is compared
// to the expected condition, and every result emits an audit event. One
// failing or erroring assertion fails the report but never stops the
// batch.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use sp_audit::{AuditEvent, AuditSink, AuditStatus};
use sp_sandbox::{Artifact, ArtifactType, RunStatus, RunStore};

use crate::assertion::{
    validate_assertions, Assertion, AssertionStatus, Expected, ExpectedType, Operator,
    MAX_QUERY_LIMIT, QUERY_TIMEOUT_SECS,
};
use crate::error::AssertError;
use crate::executor::QueryExecutor;
use crate::sql::{first_disallowed_table, is_read_only_sql};

/// Outcome of a single assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResult {
    pub name: String,
    pub query: String,
    pub expected: Expected,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<Value>,
    pub status: AssertionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

/// The full batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub summary: ReportSummary,
    pub overall_status: AssertionStatus,
    pub assertions: Vec<AssertionResult>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.overall_status == AssertionStatus::Passed
    }
}

/// Execute a validated batch and build the report.
#[allow(clippy::too_many_arguments)]
pub async fn execute_assertions(
    audit: &dyn AuditSink,
    tenant_id: Uuid,
    actor_id: Option<Uuid>,
    correlation_id: &str,
    assertions: &[Assertion],
    executor: &dyn QueryExecutor,
    allowed_tables: &[String],
) -> Result<Report, AssertError> {
    validate_assertions(assertions)?;

    let timeout = Duration::from_secs(QUERY_TIMEOUT_SECS);
    let mut results = Vec::with_capacity(assertions.len());
    let (mut passed, mut failed, mut errors) = (0usize, 0usize, 0usize);

    for assertion in assertions {
        let started = Instant::now();
        let result = run_one(assertion, executor, allowed_tables, timeout, started).await;

        match result.status {
            AssertionStatus::Passed => passed += 1,
            AssertionStatus::Failed => failed += 1,
            AssertionStatus::Error => errors += 1,
        }

        let mut event = AuditEvent::new(
            tenant_id,
            "workspace",
            "assertion_result",
            correlation_id,
            match result.status {
                AssertionStatus::Passed => AuditStatus::Success,
                AssertionStatus::Failed => AuditStatus::Error,
                AssertionStatus::Error => AuditStatus::Error,
            },
        )
        .with_resource("suiteql_assertion", result.name.clone())
        .with_payload(json!({
            "name": result.name,
            "status": result.status,
            "observed": result.observed,
            "duration_ms": result.duration_ms,
        }));
        if let Some(actor) = actor_id {
            event = event.with_actor(actor);
        }
        if let Some(error) = &result.error {
            event = event.with_error(error.clone());
        }
        audit.append(event).await?;

        results.push(result);
    }

    let overall_status = if failed == 0 && errors == 0 {
        AssertionStatus::Passed
    } else {
        AssertionStatus::Failed
    };

    info!(
        total = results.len(),
        passed, failed, errors, "assertion batch complete"
    );

    Ok(Report {
        summary: ReportSummary {
            total: results.len(),
            passed,
            failed,
            errors,
        },
        overall_status,
        assertions: results,
    })
}

/// Execute a batch as the body of a `suiteql_assertions` run.
///
/// Drives the run from queued to a terminal state and stores the report
/// as its `result_json` artifact.
#[allow(clippy::too_many_arguments)]
pub async fn execute_assertion_run(
    runs: &dyn RunStore,
    audit: &dyn AuditSink,
    tenant_id: Uuid,
    run_id: Uuid,
    actor_id: Option<Uuid>,
    assertions: &[Assertion],
    executor: &dyn QueryExecutor,
    allowed_tables: &[String],
) -> Result<Report, AssertError> {
    let mut run = runs
        .get_run(tenant_id, run_id)
        .await?
        .ok_or(sp_sandbox::SandboxError::RunNotFound)?;

    run.status = RunStatus::Running;
    run.started_at = Some(chrono::Utc::now());
    runs.update_run(run.clone()).await?;

    let started = Instant::now();
    let outcome = execute_assertions(
        audit,
        tenant_id,
        actor_id,
        &run.correlation_id,
        assertions,
        executor,
        allowed_tables,
    )
    .await;

    let duration_ms = started.elapsed().as_millis() as u64;
    run.completed_at = Some(chrono::Utc::now());
    run.duration_ms = Some(duration_ms);

    match outcome {
        Ok(report) => {
            run.status = if report.passed() {
                RunStatus::Passed
            } else {
                RunStatus::Failed
            };
            runs.update_run(run.clone()).await?;
            let payload = serde_json::to_value(&report).unwrap_or(Value::Null);
            runs.insert_artifact(Artifact::new(
                tenant_id,
                run.id,
                ArtifactType::ResultJson,
                payload.to_string(),
            ))
            .await?;
            Ok(report)
        }
        Err(err) => {
            run.status = RunStatus::Error;
            runs.update_run(run.clone()).await?;
            runs.insert_artifact(Artifact::new(
                tenant_id,
                run.id,
                ArtifactType::ResultJson,
                json!({
                    "run_id": run.id,
                    "run_type": run.run_type,
                    "status": run.status,
                    "error_message": err.to_string(),
                    "duration_ms": duration_ms,
                })
                .to_string(),
            ))
            .await?;
            Err(err)
        }
    }
}

async fn run_one(
    assertion: &Assertion,
    executor: &dyn QueryExecutor,
    allowed_tables: &[String],
    timeout: Duration,
    started: Instant,
) -> AssertionResult {
    let mut result = AssertionResult {
        name: assertion.name.clone(),
        query: assertion.query.clone(),
        expected: assertion.expected.clone(),
        observed: None,
        status: AssertionStatus::Error,
        error: None,
        duration_ms: 0,
    };

    if !is_read_only_sql(&assertion.query) {
        result.error = Some("Only SELECT queries are permitted".to_string());
        result.duration_ms = started.elapsed().as_millis() as u64;
        return result;
    }

    if let Some(table) = first_disallowed_table(&assertion.query, allowed_tables) {
        result.error = Some(format!("Table '{}' is not in the allowlist", table));
        result.duration_ms = started.elapsed().as_millis() as u64;
        return result;
    }

    match executor
        .execute(&assertion.query, MAX_QUERY_LIMIT, timeout)
        .await
    {
        Ok(rows) => {
            let observed = match assertion.expected.expect_type {
                ExpectedType::RowCount | ExpectedType::NoRows => json!(rows.row_count),
                ExpectedType::Scalar => rows.scalar().cloned().unwrap_or(Value::Null),
            };
            let satisfied = evaluate_expected(&assertion.expected, &observed);
            result.observed = Some(observed);
            result.status = if satisfied {
                AssertionStatus::Passed
            } else {
                AssertionStatus::Failed
            };
        }
        Err(message) => {
            result.error = Some(message);
        }
    }

    result.duration_ms = started.elapsed().as_millis() as u64;
    result
}

/// Whether the observed value satisfies the expected condition.
fn evaluate_expected(expected: &Expected, observed: &Value) -> bool {
    if expected.expect_type == ExpectedType::NoRows {
        return as_f64(observed) == Some(0.0);
    }

    let Some(target) = expected.value.as_ref() else {
        return false;
    };

    match expected.operator {
        Operator::Eq => values_equal(observed, target),
        Operator::Ne => !values_equal(observed, target),
        Operator::Gt => compare(observed, target, |a, b| a > b),
        Operator::Gte => compare(observed, target, |a, b| a >= b),
        Operator::Lt => compare(observed, target, |a, b| a < b),
        Operator::Lte => compare(observed, target, |a, b| a <= b),
        Operator::Between => {
            let Some(upper) = expected.value2.as_ref() else {
                return false;
            };
            compare(observed, target, |a, b| a >= b) && compare(observed, upper, |a, b| a <= b)
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn values_equal(observed: &Value, target: &Value) -> bool {
    match (as_f64(observed), as_f64(target)) {
        (Some(a), Some(b)) => a == b,
        _ => observed == target,
    }
}

fn compare(observed: &Value, target: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (as_f64(observed), as_f64(target)) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(expect_type: ExpectedType, operator: Operator, value: Value) -> Expected {
        Expected {
            expect_type,
            operator,
            value: Some(value),
            value2: None,
        }
    }

    #[test]
    fn eq_compares_numerically() {
        let e = expected(ExpectedType::RowCount, Operator::Eq, json!(7));
        assert!(evaluate_expected(&e, &json!(7)));
        assert!(evaluate_expected(&e, &json!(7.0)));
        assert!(!evaluate_expected(&e, &json!(8)));
    }

    #[test]
    fn string_observations_coerce_to_numbers() {
        let e = expected(ExpectedType::Scalar, Operator::Gte, json!(100));
        assert!(evaluate_expected(&e, &json!("150")));
        assert!(!evaluate_expected(&e, &json!("50")));
    }

    #[test]
    fn ordering_operators() {
        assert!(evaluate_expected(
            &expected(ExpectedType::RowCount, Operator::Gt, json!(5)),
            &json!(6)
        ));
        assert!(evaluate_expected(
            &expected(ExpectedType::RowCount, Operator::Lte, json!(5)),
            &json!(5)
        ));
        assert!(!evaluate_expected(
            &expected(ExpectedType::RowCount, Operator::Lt, json!(5)),
            &json!(5)
        ));
    }

    #[test]
    fn between_is_inclusive() {
        let e = Expected {
            expect_type: ExpectedType::Scalar,
            operator: Operator::Between,
            value: Some(json!(10)),
            value2: Some(json!(20)),
        };
        assert!(evaluate_expected(&e, &json!(10)));
        assert!(evaluate_expected(&e, &json!(20)));
        assert!(evaluate_expected(&e, &json!(15)));
        assert!(!evaluate_expected(&e, &json!(21)));
    }

    #[test]
    fn no_rows_expects_zero() {
        let e = Expected {
            expect_type: ExpectedType::NoRows,
            operator: Operator::Eq,
            value: None,
            value2: None,
        };
        assert!(evaluate_expected(&e, &json!(0)));
        assert!(!evaluate_expected(&e, &json!(3)));
    }

    #[test]
    fn eq_on_non_numeric_values_compares_equality() {
        let e = expected(ExpectedType::Scalar, Operator::Eq, json!("open"));
        assert!(evaluate_expected(&e, &json!("open")));
        assert!(!evaluate_expected(&e, &json!("closed")));
    }
}

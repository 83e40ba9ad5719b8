// gate.rs — Deploy prerequisite evaluation.
//
// A changeset may only be deployed when it has passing sdf_validate and
// jest_unit_test runs. The assertion prerequisite can be waived with a
// non-empty override reason, which is recorded in a dedicated audit
// event; the validate and unit-test gates are never waivable.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use sp_audit::{AuditEvent, AuditSink, AuditStatus};
use sp_sandbox::{RunStatus, RunStore, RunType};

use crate::error::AssertError;

/// How an override affected the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateOverride {
    pub applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The gate's verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    #[serde(rename = "override")]
    pub override_info: GateOverride,
}

impl GateDecision {
    fn blocked(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            blocked_reason: Some(reason.into()),
            override_info: GateOverride {
                applied: false,
                reason: None,
            },
        }
    }

    fn allowed_plain() -> Self {
        Self {
            allowed: true,
            blocked_reason: None,
            override_info: GateOverride {
                applied: false,
                reason: None,
            },
        }
    }
}

/// Evaluate the deploy prerequisites for a changeset.
#[allow(clippy::too_many_arguments)]
pub async fn evaluate_deploy_gate(
    runs: &dyn RunStore,
    audit: &dyn AuditSink,
    tenant_id: Uuid,
    actor_id: Option<Uuid>,
    correlation_id: &str,
    changeset_id: Uuid,
    require_assertions: bool,
    override_reason: Option<&str>,
) -> Result<GateDecision, AssertError> {
    let validate_passed = runs
        .find_run_for_changeset(tenant_id, changeset_id, RunType::SdfValidate, RunStatus::Passed)
        .await?
        .is_some();
    if !validate_passed {
        return Ok(GateDecision::blocked(
            "A passing sdf_validate run is required before deploy",
        ));
    }

    let tests_passed = runs
        .find_run_for_changeset(tenant_id, changeset_id, RunType::JestUnitTest, RunStatus::Passed)
        .await?
        .is_some();
    if !tests_passed {
        return Ok(GateDecision::blocked(
            "A passing jest_unit_test run is required before deploy",
        ));
    }

    if !require_assertions {
        return Ok(GateDecision::allowed_plain());
    }

    let assertions_passed = runs
        .find_run_for_changeset(
            tenant_id,
            changeset_id,
            RunType::SuiteqlAssertions,
            RunStatus::Passed,
        )
        .await?
        .is_some();

    if assertions_passed {
        return Ok(GateDecision::allowed_plain());
    }

    // The assertion gate alone may be overridden with a stated reason.
    let reason = override_reason.map(str::trim).filter(|r| !r.is_empty());
    match reason {
        Some(reason) => {
            warn!(
                changeset_id = %changeset_id,
                reason,
                "deploy gate assertion requirement overridden"
            );
            let mut event = AuditEvent::new(
                tenant_id,
                "deploy",
                "deploy.gate_override",
                correlation_id,
                AuditStatus::Success,
            )
            .with_resource("workspace_changeset", changeset_id.to_string())
            .with_payload(json!({
                "changeset_id": changeset_id,
                "waived": "suiteql_assertions",
                "reason": reason,
            }));
            if let Some(actor) = actor_id {
                event = event.with_actor(actor);
            }
            audit.append(event).await?;

            Ok(GateDecision {
                allowed: true,
                blocked_reason: None,
                override_info: GateOverride {
                    applied: true,
                    reason: Some(reason.to_string()),
                },
            })
        }
        None => {
            info!(changeset_id = %changeset_id, "deploy blocked on assertions");
            Ok(GateDecision::blocked(
                "A passing suiteql_assertions run is required before deploy",
            ))
        }
    }
}

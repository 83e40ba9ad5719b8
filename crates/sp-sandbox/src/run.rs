// run.rs — The Run entity.
//
// A run is immutable once it reaches a terminal state. `suiteql_assertions`
// runs carry no subprocess; the assertion engine drives them to a terminal
// state through the same store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four allowlisted run families.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    SdfValidate,
    JestUnitTest,
    SuiteqlAssertions,
    DeploySandbox,
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunType::SdfValidate => "sdf_validate",
            RunType::JestUnitTest => "jest_unit_test",
            RunType::SuiteqlAssertions => "suiteql_assertions",
            RunType::DeploySandbox => "deploy_sandbox",
        };
        f.write_str(name)
    }
}

/// Lifecycle state: queued → running → {passed, failed, error}.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Passed,
    Failed,
    Error,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Passed | RunStatus::Failed | RunStatus::Error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// An execution record of an allowlisted command against a workspace
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub workspace_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset_id: Option<Uuid>,
    pub run_type: RunType,
    pub status: RunStatus,
    pub triggered_by: Uuid,
    pub correlation_id: String,

    /// The allowlisted command line, for display only.
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Run {
    pub fn new(
        tenant_id: Uuid,
        workspace_id: Uuid,
        run_type: RunType,
        triggered_by: Uuid,
        correlation_id: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            workspace_id,
            changeset_id: None,
            run_type,
            status: RunStatus::Queued,
            triggered_by,
            correlation_id: correlation_id.into(),
            command: command.into(),
            exit_code: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            duration_ms: None,
        }
    }

    /// Attach a changeset overlay and return self (builder pattern).
    pub fn with_changeset(mut self, changeset_id: Uuid) -> Self {
        self.changeset_id = Some(changeset_id);
        self
    }
}

// runner.rs — Run execution: materialize, execute, capture, clean up.
//
// The runner owns the full lifecycle of a subprocess-backed run. The
// scratch directory is deleted in every outcome (the TempDir guard cleans
// up even on early error returns), and artifacts are sanitized before
// storage so no raw byte stream ever reaches the repository.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use sp_audit::{AuditEvent, AuditSink, AuditStatus};
use sp_changeset::ChangesetStore;
use sp_workspace::WorkspaceStore;

use crate::allowlist::command_spec;
use crate::artifact::{sanitize_artifact_content, Artifact, ArtifactType};
use crate::error::SandboxError;
use crate::materialize::{apply_changeset_overlay, load_snapshot, write_snapshot};
use crate::run::{Run, RunStatus, RunType};
use crate::store::RunStore;
use crate::subprocess::Subprocess;

/// Executes allowlisted commands against workspace snapshots.
pub struct SandboxRunner {
    files: Arc<dyn WorkspaceStore>,
    changesets: Arc<dyn ChangesetStore>,
    runs: Arc<dyn RunStore>,
    audit: Arc<dyn AuditSink>,
    subprocess: Arc<dyn Subprocess>,
}

impl SandboxRunner {
    pub fn new(
        files: Arc<dyn WorkspaceStore>,
        changesets: Arc<dyn ChangesetStore>,
        runs: Arc<dyn RunStore>,
        audit: Arc<dyn AuditSink>,
        subprocess: Arc<dyn Subprocess>,
    ) -> Self {
        Self {
            files,
            changesets,
            runs,
            audit,
            subprocess,
        }
    }

    /// Create a run in `queued` state. The run type is validated against
    /// the allowlist before anything touches storage.
    pub async fn create_run(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
        run_type: RunType,
        triggered_by: Uuid,
        changeset_id: Option<Uuid>,
        correlation_id: &str,
    ) -> Result<Run, SandboxError> {
        let spec = command_spec(run_type);
        let mut run = Run::new(
            tenant_id,
            workspace_id,
            run_type,
            triggered_by,
            correlation_id,
            spec.display(),
        );
        if let Some(changeset_id) = changeset_id {
            run = run.with_changeset(changeset_id);
        }
        self.runs.insert_run(run.clone()).await?;
        Ok(run)
    }

    /// Execute a queued run to a terminal state.
    ///
    /// Materializes the snapshot, executes the allowlisted command with a
    /// minimal environment, captures sanitized artifacts, and deletes the
    /// scratch directory whatever the outcome. Subprocess failure and
    /// timeout land the run in a terminal state rather than returning an
    /// error; only pre-flight failures (unknown run, internal run type)
    /// surface as `Err`.
    pub async fn execute_run(&self, tenant_id: Uuid, run_id: Uuid) -> Result<Run, SandboxError> {
        let mut run = self
            .runs
            .get_run(tenant_id, run_id)
            .await?
            .ok_or(SandboxError::RunNotFound)?;

        let spec = command_spec(run.run_type);
        let Some(argv) = spec.argv.clone() else {
            return Err(SandboxError::InternalRunType(run.run_type.to_string()));
        };

        run.status = RunStatus::Running;
        run.started_at = Some(Utc::now());
        self.runs.update_run(run.clone()).await?;
        self.audit_run(&run, "run_started", AuditStatus::Success, json!({
            "run_type": run.run_type,
            "workspace_id": run.workspace_id,
        }), None)
        .await?;

        let scratch = tempfile::Builder::new()
            .prefix(&format!("suitepilot_run_{}_", run.tenant_id))
            .tempdir()?;
        let started = Instant::now();

        let outcome = self
            .execute_in_scratch(&mut run, &argv, spec.timeout, scratch.path(), started)
            .await;

        // Scratch cleanup happens in every outcome.
        scratch.close()?;

        match outcome {
            Ok(()) => Ok(run),
            Err(SandboxError::Timeout { seconds }) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                run.status = RunStatus::Error;
                run.completed_at = Some(Utc::now());
                run.duration_ms = Some(duration_ms);
                self.runs.update_run(run.clone()).await?;

                let message = format!("Command timed out after {}s", seconds);
                self.store_artifact(&run, ArtifactType::Stderr, &message).await?;
                self.store_artifact(
                    &run,
                    ArtifactType::ResultJson,
                    &json!({
                        "run_id": run.id,
                        "run_type": run.run_type,
                        "status": run.status,
                        "error_category": "TIMEOUT",
                        "error_message": message,
                        "duration_ms": duration_ms,
                    })
                    .to_string(),
                )
                .await?;
                self.audit_run(
                    &run,
                    "run_failed",
                    AuditStatus::Error,
                    json!({
                        "run_type": run.run_type,
                        "error_category": "TIMEOUT",
                        "duration_ms": duration_ms,
                    }),
                    Some(&message),
                )
                .await?;
                Ok(run)
            }
            Err(err) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                run.status = RunStatus::Error;
                run.completed_at = Some(Utc::now());
                run.duration_ms = Some(duration_ms);
                self.runs.update_run(run.clone()).await?;

                let message = err.to_string();
                error!(run_id = %run.id, error = %message, "run execution failed");
                self.store_artifact(&run, ArtifactType::Stderr, &message).await?;
                self.store_artifact(
                    &run,
                    ArtifactType::ResultJson,
                    &json!({
                        "run_id": run.id,
                        "run_type": run.run_type,
                        "status": run.status,
                        "error_category": "EXECUTION_ERROR",
                        "error_message": message,
                        "duration_ms": duration_ms,
                    })
                    .to_string(),
                )
                .await?;
                self.audit_run(
                    &run,
                    "run_failed",
                    AuditStatus::Error,
                    json!({
                        "run_type": run.run_type,
                        "error_category": "EXECUTION_ERROR",
                        "duration_ms": duration_ms,
                    }),
                    Some(&message),
                )
                .await?;
                Ok(run)
            }
        }
    }

    async fn execute_in_scratch(
        &self,
        run: &mut Run,
        argv: &[String],
        timeout: std::time::Duration,
        scratch: &Path,
        started: Instant,
    ) -> Result<(), SandboxError> {
        let mut snapshot = load_snapshot(self.files.as_ref(), run.tenant_id, run.workspace_id).await?;
        if let Some(changeset_id) = run.changeset_id {
            apply_changeset_overlay(
                self.changesets.as_ref(),
                run.tenant_id,
                changeset_id,
                &mut snapshot,
            )
            .await?;
        }
        let file_count = write_snapshot(scratch, &snapshot)?;

        // Minimal environment: the subprocess sees nothing of the host
        // beyond PATH, and both HOME and TMPDIR point into the scratch.
        let env: HashMap<String, String> = HashMap::from([
            (
                "PATH".to_string(),
                std::env::var("PATH").unwrap_or_else(|_| "/usr/local/bin:/usr/bin:/bin".into()),
            ),
            ("HOME".to_string(), scratch.display().to_string()),
            ("TMPDIR".to_string(), scratch.display().to_string()),
        ]);

        let output = self.subprocess.run(argv, scratch, &env, timeout).await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        run.exit_code = Some(output.exit_code);
        run.status = if output.exit_code == 0 {
            RunStatus::Passed
        } else {
            RunStatus::Failed
        };
        run.completed_at = Some(Utc::now());
        run.duration_ms = Some(duration_ms);
        self.runs.update_run(run.clone()).await?;

        if !stdout.is_empty() {
            self.store_artifact(run, ArtifactType::Stdout, &stdout).await?;
        }
        if !stderr.is_empty() {
            self.store_artifact(run, ArtifactType::Stderr, &stderr).await?;
        }

        if run.run_type == RunType::JestUnitTest {
            if let Some(report) = parse_json_output(&stdout) {
                self.store_artifact(run, ArtifactType::ReportJson, &report.to_string())
                    .await?;
            }
            let coverage_path = scratch.join("coverage").join("coverage-summary.json");
            if coverage_path.is_file() {
                let coverage = std::fs::read_to_string(&coverage_path)?;
                self.store_artifact(run, ArtifactType::CoverageJson, &coverage).await?;
            }
        }

        let result_payload = json!({
            "run_id": run.id,
            "run_type": run.run_type,
            "status": run.status,
            "exit_code": output.exit_code,
            "duration_ms": duration_ms,
            "materialized_file_count": file_count,
        });
        self.store_artifact(run, ArtifactType::ResultJson, &result_payload.to_string())
            .await?;

        let (action, status, error_message) = if run.status == RunStatus::Passed {
            ("run_succeeded", AuditStatus::Success, None)
        } else {
            ("run_failed", AuditStatus::Error, Some("Command exited non-zero"))
        };
        self.audit_run(run, action, status, result_payload, error_message)
            .await?;

        info!(run_id = %run.id, status = %run.status, duration_ms, "run completed");
        Ok(())
    }

    async fn store_artifact(
        &self,
        run: &Run,
        artifact_type: ArtifactType,
        raw: &str,
    ) -> Result<Artifact, SandboxError> {
        let (content, truncated) = sanitize_artifact_content(raw);
        let artifact = Artifact::new(run.tenant_id, run.id, artifact_type, content);
        self.runs.insert_artifact(artifact.clone()).await?;
        self.audit_run(
            run,
            "artifact_created",
            AuditStatus::Success,
            json!({
                "run_id": run.id,
                "artifact_type": artifact_type,
                "size_bytes": artifact.size_bytes,
                "sha256_hash": artifact.sha256_hash,
                "truncated": truncated,
            }),
            None,
        )
        .await?;
        Ok(artifact)
    }

    async fn audit_run(
        &self,
        run: &Run,
        action: &str,
        status: AuditStatus,
        payload: Value,
        error_message: Option<&str>,
    ) -> Result<(), SandboxError> {
        let mut event = AuditEvent::new(
            run.tenant_id,
            "workspace",
            action,
            run.correlation_id.clone(),
            status,
        )
        .with_actor(run.triggered_by)
        .with_resource("workspace_run", run.id.to_string())
        .with_payload(payload);
        if let Some(message) = error_message {
            event = event.with_error(message);
        }
        self.audit.append(event).await?;
        Ok(())
    }
}

/// Parse command stdout as JSON, tolerating log noise around the object
/// and wrapping top-level arrays as `{"result": ...}`.
fn parse_json_output(raw: &str) -> Option<Value> {
    let stripped = raw.trim();
    if stripped.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<Value>(stripped) {
        return Some(wrap_non_object(parsed));
    }

    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&stripped[start..=end])
        .ok()
        .map(wrap_non_object)
}

fn wrap_non_object(value: Value) -> Value {
    if value.is_object() {
        value
    } else {
        json!({ "result": value })
    }
}

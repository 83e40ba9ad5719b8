// sandbox_runs.rs — Runner behavior with a scripted subprocess.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use sp_changeset::{
    create_unified_diff, propose_patch, transition_changeset, TransitionAction,
};
use sp_sandbox::{
    ArtifactType, RunStatus, RunStore, RunType, SandboxError, SandboxRunner, Subprocess,
    SubprocessOutput,
};
use sp_store::MemoryStore;
use sp_workspace::{Workspace, WorkspaceFile, WorkspaceStore};

/// Scripted subprocess: records its invocation, then replays a result.
struct ScriptedSubprocess {
    exit_code: i32,
    stdout: &'static str,
    stderr: &'static str,
    hang: bool,
    seen_cwd: Mutex<Option<PathBuf>>,
    seen_env: Mutex<Option<HashMap<String, String>>>,
}

impl ScriptedSubprocess {
    fn ok(stdout: &'static str) -> Self {
        Self {
            exit_code: 0,
            stdout,
            stderr: "",
            hang: false,
            seen_cwd: Mutex::new(None),
            seen_env: Mutex::new(None),
        }
    }

    fn failing(stderr: &'static str) -> Self {
        Self {
            exit_code: 1,
            stdout: "",
            stderr,
            hang: false,
            seen_cwd: Mutex::new(None),
            seen_env: Mutex::new(None),
        }
    }

    fn hanging() -> Self {
        Self {
            exit_code: 0,
            stdout: "",
            stderr: "",
            hang: true,
            seen_cwd: Mutex::new(None),
            seen_env: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Subprocess for ScriptedSubprocess {
    async fn run(
        &self,
        _argv: &[String],
        cwd: &Path,
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<SubprocessOutput, SandboxError> {
        *self.seen_cwd.lock().unwrap() = Some(cwd.to_path_buf());
        *self.seen_env.lock().unwrap() = Some(env.clone());
        if self.hang {
            return Err(SandboxError::Timeout {
                seconds: timeout.as_secs(),
            });
        }
        Ok(SubprocessOutput {
            exit_code: self.exit_code,
            stdout: self.stdout.as_bytes().to_vec(),
            stderr: self.stderr.as_bytes().to_vec(),
        })
    }
}

struct Fixture {
    store: MemoryStore,
    tenant: Uuid,
    workspace: Uuid,
    user: Uuid,
}

async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let tenant = Uuid::new_v4();
    let user = Uuid::new_v4();
    let workspace = Workspace::new(tenant, "SuiteScripts", user);
    let workspace_id = workspace.id;
    store.create_workspace(workspace).await.unwrap();
    store
        .put_file(WorkspaceFile::new_file(
            tenant,
            workspace_id,
            "src/app.ts",
            "const x = 1;\n",
        ))
        .await
        .unwrap();
    Fixture {
        store,
        tenant,
        workspace: workspace_id,
        user,
    }
}

fn runner(store: &MemoryStore, subprocess: Arc<dyn Subprocess>) -> SandboxRunner {
    SandboxRunner::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        subprocess,
    )
}

#[tokio::test]
async fn passing_run_stores_artifacts_and_cleans_scratch() {
    let fx = fixture().await;
    let subprocess = Arc::new(ScriptedSubprocess::ok("validation passed\n"));
    let runner = runner(&fx.store, subprocess.clone());

    let run = runner
        .create_run(
            fx.tenant,
            fx.workspace,
            RunType::SdfValidate,
            fx.user,
            None,
            "corr-1",
        )
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Queued);

    let finished = runner.execute_run(fx.tenant, run.id).await.unwrap();
    assert_eq!(finished.status, RunStatus::Passed);
    assert_eq!(finished.exit_code, Some(0));

    // The snapshot was materialized into the scratch dir and the scratch
    // dir is gone afterwards.
    let cwd = subprocess.seen_cwd.lock().unwrap().clone().unwrap();
    assert!(!cwd.exists());

    // Minimal environment only.
    let env = subprocess.seen_env.lock().unwrap().clone().unwrap();
    assert_eq!(env.get("HOME"), Some(&cwd.display().to_string()));
    assert_eq!(env.get("TMPDIR"), Some(&cwd.display().to_string()));
    assert!(env.contains_key("PATH"));
    assert_eq!(env.len(), 3);

    let artifacts = fx.store.list_artifacts(fx.tenant, run.id).await.unwrap();
    let types: Vec<ArtifactType> = artifacts.iter().map(|a| a.artifact_type).collect();
    assert!(types.contains(&ArtifactType::Stdout));
    assert!(types.contains(&ArtifactType::ResultJson));

    let result_json = artifacts
        .iter()
        .find(|a| a.artifact_type == ArtifactType::ResultJson)
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&result_json.content).unwrap();
    assert_eq!(parsed["status"], "passed");
    assert_eq!(parsed["materialized_file_count"], 1);
}

#[tokio::test]
async fn timeout_lands_in_error_with_timeout_artifacts() {
    let fx = fixture().await;
    let subprocess = Arc::new(ScriptedSubprocess::hanging());
    let runner = runner(&fx.store, subprocess.clone());

    let run = runner
        .create_run(
            fx.tenant,
            fx.workspace,
            RunType::JestUnitTest,
            fx.user,
            None,
            "corr-2",
        )
        .await
        .unwrap();
    let finished = runner.execute_run(fx.tenant, run.id).await.unwrap();
    assert_eq!(finished.status, RunStatus::Error);

    let artifacts = fx.store.list_artifacts(fx.tenant, run.id).await.unwrap();
    let stderr = artifacts
        .iter()
        .find(|a| a.artifact_type == ArtifactType::Stderr)
        .unwrap();
    assert!(stderr.content.contains("timed out"));

    let result_json = artifacts
        .iter()
        .find(|a| a.artifact_type == ArtifactType::ResultJson)
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&result_json.content).unwrap();
    assert_eq!(parsed["error_category"], "TIMEOUT");

    let cwd = subprocess.seen_cwd.lock().unwrap().clone().unwrap();
    assert!(!cwd.exists());

    // The jest timeout honors the 120 second family cap.
    let audits = fx.store.audit_events_for_tenant(fx.tenant).await;
    assert!(audits.iter().any(|e| e.action == "run_started"));
    assert!(audits.iter().any(|e| e.action == "run_failed"));
}

#[tokio::test]
async fn failing_command_is_failed_not_error() {
    let fx = fixture().await;
    let runner = runner(&fx.store, Arc::new(ScriptedSubprocess::failing("boom\n")));

    let run = runner
        .create_run(
            fx.tenant,
            fx.workspace,
            RunType::SdfValidate,
            fx.user,
            None,
            "corr-3",
        )
        .await
        .unwrap();
    let finished = runner.execute_run(fx.tenant, run.id).await.unwrap();
    assert_eq!(finished.status, RunStatus::Failed);
    assert_eq!(finished.exit_code, Some(1));
}

#[tokio::test]
async fn jest_stdout_becomes_report_artifact() {
    let fx = fixture().await;
    let runner = runner(
        &fx.store,
        Arc::new(ScriptedSubprocess::ok(
            "{\"numTotalTests\": 4, \"numPassedTests\": 4}",
        )),
    );

    let run = runner
        .create_run(
            fx.tenant,
            fx.workspace,
            RunType::JestUnitTest,
            fx.user,
            None,
            "corr-4",
        )
        .await
        .unwrap();
    runner.execute_run(fx.tenant, run.id).await.unwrap();

    let artifacts = fx.store.list_artifacts(fx.tenant, run.id).await.unwrap();
    let report = artifacts
        .iter()
        .find(|a| a.artifact_type == ArtifactType::ReportJson)
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&report.content).unwrap();
    assert_eq!(parsed["numTotalTests"], 4);
}

#[tokio::test]
async fn artifact_secrets_are_redacted() {
    let fx = fixture().await;
    let runner = runner(
        &fx.store,
        Arc::new(ScriptedSubprocess::ok(
            "connecting with api_key=sk-live-12345\ndone\n",
        )),
    );

    let run = runner
        .create_run(
            fx.tenant,
            fx.workspace,
            RunType::SdfValidate,
            fx.user,
            None,
            "corr-5",
        )
        .await
        .unwrap();
    runner.execute_run(fx.tenant, run.id).await.unwrap();

    let artifacts = fx.store.list_artifacts(fx.tenant, run.id).await.unwrap();
    let stdout = artifacts
        .iter()
        .find(|a| a.artifact_type == ArtifactType::Stdout)
        .unwrap();
    assert!(stdout.content.contains("***REDACTED***"));
    assert!(!stdout.content.contains("sk-live-12345"));
}

#[tokio::test]
async fn unapproved_changeset_overlay_fails_the_run() {
    let fx = fixture().await;

    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user,
        "src/app.ts",
        &create_unified_diff("const x = 1;\n", "const x = 2;\n"),
        "Bump x",
        None,
    )
    .await
    .unwrap();

    let runner = runner(&fx.store, Arc::new(ScriptedSubprocess::ok("ok")));
    let run = runner
        .create_run(
            fx.tenant,
            fx.workspace,
            RunType::SdfValidate,
            fx.user,
            Some(outcome.changeset.id),
            "corr-6",
        )
        .await
        .unwrap();

    // The changeset is still draft, so materialization refuses it and
    // the run terminates in error.
    let finished = runner.execute_run(fx.tenant, run.id).await.unwrap();
    assert_eq!(finished.status, RunStatus::Error);
}

#[tokio::test]
async fn approved_changeset_overlay_is_materialized() {
    let fx = fixture().await;

    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user,
        "src/app.ts",
        &create_unified_diff("const x = 1;\n", "const x = 2;\n"),
        "Bump x",
        None,
    )
    .await
    .unwrap();
    let cs_id = outcome.changeset.id;
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Submit, fx.user, None)
        .await
        .unwrap();
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Approve, fx.user, None)
        .await
        .unwrap();

    let runner = runner(&fx.store, Arc::new(ScriptedSubprocess::ok("ok")));
    let run = runner
        .create_run(
            fx.tenant,
            fx.workspace,
            RunType::SdfValidate,
            fx.user,
            Some(cs_id),
            "corr-7",
        )
        .await
        .unwrap();
    let finished = runner.execute_run(fx.tenant, run.id).await.unwrap();
    assert_eq!(finished.status, RunStatus::Passed);

    // The overlay did not mutate the stored workspace file.
    let file = fx
        .store
        .get_file(fx.tenant, fx.workspace, "src/app.ts")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.content, "const x = 1;\n");
}

#[tokio::test]
async fn internal_run_type_is_not_executable_by_the_runner() {
    let fx = fixture().await;
    let runner = runner(&fx.store, Arc::new(ScriptedSubprocess::ok("ok")));
    let run = runner
        .create_run(
            fx.tenant,
            fx.workspace,
            RunType::SuiteqlAssertions,
            fx.user,
            None,
            "corr-8",
        )
        .await
        .unwrap();

    let err = runner.execute_run(fx.tenant, run.id).await.unwrap_err();
    assert!(matches!(err, SandboxError::InternalRunType(_)));
}

#[tokio::test]
async fn terminal_runs_are_immutable() {
    let fx = fixture().await;
    let runner = runner(&fx.store, Arc::new(ScriptedSubprocess::ok("ok")));
    let run = runner
        .create_run(
            fx.tenant,
            fx.workspace,
            RunType::SdfValidate,
            fx.user,
            None,
            "corr-9",
        )
        .await
        .unwrap();
    let mut finished = runner.execute_run(fx.tenant, run.id).await.unwrap();

    finished.status = RunStatus::Running;
    assert!(fx.store.update_run(finished).await.is_err());
}

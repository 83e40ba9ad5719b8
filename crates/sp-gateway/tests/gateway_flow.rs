// gateway_flow.rs — Governed tool calls end to end through the dispatcher.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use sp_assert::{QueryExecutor, QueryResult};
use sp_changeset::{transition_changeset, create_unified_diff, TransitionAction};
use sp_gateway::{build_dispatcher, GatewayDeps};
use sp_sandbox::{SandboxError, Subprocess, SubprocessOutput};
use sp_store::MemoryStore;
use sp_tools::{Dispatcher, RateLimiter, SystemClock, ToolContext, ToolMetrics};
use sp_workspace::{Workspace, WorkspaceFile, WorkspaceStore};

struct OkSubprocess;

#[async_trait]
impl Subprocess for OkSubprocess {
    async fn run(
        &self,
        _argv: &[String],
        _cwd: &Path,
        _env: &HashMap<String, String>,
        _timeout: Duration,
    ) -> Result<SubprocessOutput, SandboxError> {
        Ok(SubprocessOutput {
            exit_code: 0,
            stdout: b"ok\n".to_vec(),
            stderr: Vec::new(),
        })
    }
}

struct CountExecutor;

#[async_trait]
impl QueryExecutor for CountExecutor {
    async fn execute(
        &self,
        _query: &str,
        _limit: u32,
        _timeout: Duration,
    ) -> Result<QueryResult, String> {
        Ok(QueryResult {
            columns: vec!["cnt".to_string()],
            rows: vec![vec![json!(7)]],
            row_count: 1,
        })
    }
}

struct Fixture {
    store: MemoryStore,
    dispatcher: Dispatcher,
    tenant: Uuid,
    actor: Uuid,
    workspace: Uuid,
}

async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let tenant = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let workspace = Workspace::new(tenant, "SuiteScripts", actor);
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

    let deps = GatewayDeps::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(CountExecutor),
        Arc::new(OkSubprocess),
        vec!["transaction".to_string()],
    );
    let dispatcher = build_dispatcher(
        deps,
        Arc::new(RateLimiter::new()),
        Arc::new(SystemClock),
        Arc::new(ToolMetrics::new()),
    );

    Fixture {
        store,
        dispatcher,
        tenant,
        actor,
        workspace: workspace_id,
    }
}

fn ctx(fx: &Fixture) -> ToolContext {
    ToolContext::new(fx.tenant, Some(fx.actor), "corr-gw")
        .with_entitlements(["mcp_tools", "workspace"])
}

fn changeset_id_of(result: &Value) -> Uuid {
    Uuid::try_parse(result["changeset_id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn suiteql_tool_returns_rows_with_injected_limit() {
    let fx = fixture().await;
    let result = fx
        .dispatcher
        .execute(
            "netsuite_suiteql",
            json!({"query": "SELECT COUNT(*) AS cnt FROM transaction"}),
            &ctx(&fx),
        )
        .await;
    assert_eq!(result["row_count"], 1);
    assert_eq!(result["rows"][0][0], 7);

    // The governor recorded validated params including the default limit.
    let audits = fx.store.audit_events_for_tenant(fx.tenant).await;
    let requested = audits
        .iter()
        .find(|e| e.action == "tool.requested")
        .unwrap();
    assert_eq!(requested.payload["params"]["limit"], 100);
}

#[tokio::test]
async fn workspace_read_tools_work_through_governance() {
    let fx = fixture().await;
    let context = ctx(&fx);

    let listing = fx
        .dispatcher
        .execute(
            "workspace_list_files",
            json!({"workspace_id": fx.workspace.to_string()}),
            &context,
        )
        .await;
    assert_eq!(listing["row_count"], 1);
    let file_id = listing["files"][0]["file_id"].as_str().unwrap().to_string();

    let read = fx
        .dispatcher
        .execute(
            "workspace_read_file",
            json!({"workspace_id": fx.workspace.to_string(), "file_id": file_id}),
            &context,
        )
        .await;
    assert_eq!(read["content"], "const x = 1;");

    let search = fx
        .dispatcher
        .execute(
            "workspace_search",
            json!({"workspace_id": fx.workspace.to_string(), "query": "const"}),
            &context,
        )
        .await;
    assert_eq!(search["row_count"], 1);
}

#[tokio::test]
async fn propose_validate_test_deploy_pipeline() {
    let fx = fixture().await;
    let context = ctx(&fx);

    // Propose a patch through the tool surface.
    let proposal = fx
        .dispatcher
        .execute(
            "workspace_propose_patch",
            json!({
                "workspace_id": fx.workspace.to_string(),
                "file_path": "src/app.ts",
                "unified_diff": create_unified_diff("const x = 1;\n", "const x = 2;\n"),
                "title": "Bump x",
                "rationale": "x should be 2",
            }),
            &context,
        )
        .await;
    assert_eq!(proposal["operation"], "modify");
    let cs_id = changeset_id_of(&proposal);

    // Review happens outside the tool surface.
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Submit, fx.actor, None)
        .await
        .unwrap();
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Approve, fx.actor, None)
        .await
        .unwrap();

    // Deploy is blocked until validation and tests pass.
    let blocked = fx
        .dispatcher
        .execute(
            "workspace_deploy_sandbox",
            json!({"changeset_id": cs_id.to_string()}),
            &context,
        )
        .await;
    assert_eq!(blocked["allowed"], false);

    let validate = fx
        .dispatcher
        .execute(
            "workspace_run_validate",
            json!({
                "workspace_id": fx.workspace.to_string(),
                "changeset_id": cs_id.to_string(),
            }),
            &context,
        )
        .await;
    assert_eq!(validate["status"], "passed");

    let tests = fx
        .dispatcher
        .execute(
            "workspace_run_unit_tests",
            json!({
                "workspace_id": fx.workspace.to_string(),
                "changeset_id": cs_id.to_string(),
            }),
            &context,
        )
        .await;
    assert_eq!(tests["status"], "passed");

    // Assertions satisfied by a passing batch run.
    let assertions = fx
        .dispatcher
        .execute(
            "workspace_run_suiteql_assertions",
            json!({
                "changeset_id": cs_id.to_string(),
                "assertions": [{
                    "name": "one row",
                    "query": "SELECT COUNT(*) FROM transaction",
                    "expected": {"type": "row_count", "operator": "eq", "value": 1}
                }],
            }),
            &context,
        )
        .await;
    assert_eq!(assertions["overall_status"], "passed");

    // Now the gated deploy goes through and executes a run.
    let deploy = fx
        .dispatcher
        .execute(
            "workspace_deploy_sandbox",
            json!({
                "changeset_id": cs_id.to_string(),
                "require_assertions": true,
            }),
            &context,
        )
        .await;
    assert_eq!(deploy["allowed"], true);
    assert_eq!(deploy["run_status"], "passed");

    // Apply the changeset through the tool surface.
    let applied = fx
        .dispatcher
        .execute(
            "workspace_apply_patch",
            json!({"changeset_id": cs_id.to_string()}),
            &context,
        )
        .await;
    assert_eq!(applied["status"], "applied");

    let file = fx
        .store
        .get_file(fx.tenant, fx.workspace, "src/app.ts")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.content, "const x = 2;\n");

    // Every governed call carried the same correlation ID through its
    // audit events.
    let audits = fx.store.audit_events_for_tenant(fx.tenant).await;
    assert!(audits.len() > 10);
    assert!(audits
        .iter()
        .filter(|e| e.category == "tool_call")
        .all(|e| e.correlation_id == "corr-gw"));
}

#[tokio::test]
async fn apply_before_approval_is_an_error_payload() {
    let fx = fixture().await;
    let context = ctx(&fx);

    let proposal = fx
        .dispatcher
        .execute(
            "workspace_propose_patch",
            json!({
                "workspace_id": fx.workspace.to_string(),
                "file_path": "src/app.ts",
                "unified_diff": create_unified_diff("const x = 1;\n", "const x = 2;\n"),
                "title": "Bump x",
            }),
            &context,
        )
        .await;
    let cs_id = changeset_id_of(&proposal);

    let result = fx
        .dispatcher
        .execute(
            "workspace_apply_patch",
            json!({"changeset_id": cs_id.to_string()}),
            &context,
        )
        .await;
    assert!(result["error"]
        .as_str()
        .unwrap()
        .contains("must be approved"));

    // The failure is audited as tool.failed, never raised.
    let audits = fx.store.audit_events_for_tenant(fx.tenant).await;
    assert!(audits.iter().any(|e| e.action == "tool.failed"));
}

#[tokio::test]
async fn sample_table_read_rejects_hostile_table_names() {
    let fx = fixture().await;
    let result = fx
        .dispatcher
        .execute(
            "data_sample_table_read",
            json!({"table_name": "transaction; DROP TABLE users"}),
            &ctx(&fx),
        )
        .await;
    assert!(result["error"].as_str().unwrap().contains("Invalid table name"));
}

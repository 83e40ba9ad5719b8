// handlers.rs — Tool handler implementations.
//
// Handlers receive parameters already filtered by the governor's
// allowlist. They parse IDs strictly, call into the engines, and shape
// results as plain JSON. Returned errors become `{"error": ...}` at the
// governance boundary; they never unwind further.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use sp_assert::{
    evaluate_deploy_gate, execute_assertion_run, Assertion, QueryExecutor,
};
use sp_changeset::{apply_changeset, propose_patch, ChangesetStore};
use sp_sandbox::{RunType, SandboxRunner};
use sp_tools::{ToolContext, ToolError, ToolHandler};
use sp_workspace::WorkspaceStore;

use crate::wiring::GatewayDeps;

fn parse_uuid(params: &Value, key: &str) -> Result<Uuid, ToolError> {
    let raw = params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::Handler(format!("Missing required parameter '{}'", key)))?;
    Uuid::try_parse(raw).map_err(|_| ToolError::Handler(format!("Invalid {}: '{}'", key, raw)))
}

fn require_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::Handler(format!("Missing required parameter '{}'", key)))
}

fn actor(ctx: &ToolContext) -> Result<Uuid, ToolError> {
    ctx.actor_id
        .ok_or_else(|| ToolError::Handler("This tool requires an acting user".to_string()))
}

// ── Health ───────────────────────────────────────────────────────

pub struct HealthHandler;

#[async_trait]
impl ToolHandler for HealthHandler {
    async fn call(&self, _ctx: &ToolContext, _params: Value) -> Result<Value, ToolError> {
        Ok(json!({"status": "ok"}))
    }
}

// ── Query execution ──────────────────────────────────────────────

/// Runs SuiteQL through the injected executor.
pub struct SuiteqlHandler {
    pub executor: Arc<dyn QueryExecutor>,
}

#[async_trait]
impl ToolHandler for SuiteqlHandler {
    async fn call(&self, _ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let query = require_str(&params, "query")?;
        let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(100) as u32;

        let result = self
            .executor
            .execute(query, limit, std::time::Duration::from_secs(30))
            .await
            .map_err(ToolError::Handler)?;

        Ok(json!({
            "columns": result.columns,
            "rows": result.rows,
            "row_count": result.row_count,
        }))
    }
}

/// Reads sample rows from one table by name.
pub struct SampleTableHandler {
    pub executor: Arc<dyn QueryExecutor>,
}

#[async_trait]
impl ToolHandler for SampleTableHandler {
    async fn call(&self, _ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let table = require_str(&params, "table_name")?;
        if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ToolError::Handler(format!("Invalid table name: '{}'", table)));
        }
        let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(100) as u32;

        let query = format!("SELECT * FROM {} FETCH FIRST {} ROWS ONLY", table, limit);
        let result = self
            .executor
            .execute(&query, limit, std::time::Duration::from_secs(10))
            .await
            .map_err(ToolError::Handler)?;

        Ok(json!({
            "table": table,
            "columns": result.columns,
            "rows": result.rows,
            "row_count": result.row_count,
        }))
    }
}

// ── Workspace reads ──────────────────────────────────────────────

pub struct ListFilesHandler {
    pub files: Arc<dyn WorkspaceStore>,
}

#[async_trait]
impl ToolHandler for ListFilesHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let workspace_id = parse_uuid(&params, "workspace_id")?;
        let directory = params.get("directory").and_then(Value::as_str).unwrap_or("");
        let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(100) as usize;

        let files = self
            .files
            .list_files(ctx.tenant_id, workspace_id)
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?;

        let listed: Vec<Value> = files
            .iter()
            .filter(|f| directory.is_empty() || f.path.starts_with(directory))
            .take(limit)
            .map(|f| {
                json!({
                    "file_id": f.id,
                    "path": f.path,
                    "size_bytes": f.size_bytes,
                    "sha256": f.sha256_hash,
                })
            })
            .collect();

        Ok(json!({"files": listed, "row_count": listed.len()}))
    }
}

pub struct ReadFileHandler {
    pub files: Arc<dyn WorkspaceStore>,
}

#[async_trait]
impl ToolHandler for ReadFileHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let workspace_id = parse_uuid(&params, "workspace_id")?;
        let file_id = parse_uuid(&params, "file_id")?;

        let files = self
            .files
            .list_files(ctx.tenant_id, workspace_id)
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?;
        let file = files
            .into_iter()
            .find(|f| f.id == file_id)
            .ok_or_else(|| ToolError::Handler("File not found".to_string()))?;

        let lines: Vec<&str> = file.content.lines().collect();
        let start = params
            .get("line_start")
            .and_then(Value::as_u64)
            .unwrap_or(1)
            .max(1) as usize;
        let end = params
            .get("line_end")
            .and_then(Value::as_u64)
            .unwrap_or(lines.len() as u64) as usize;
        let slice = lines
            .get(start.saturating_sub(1)..end.min(lines.len()))
            .unwrap_or(&[]);

        Ok(json!({
            "path": file.path,
            "line_start": start,
            "line_end": end.min(lines.len()),
            "total_lines": lines.len(),
            "content": slice.join("\n"),
        }))
    }
}

pub struct SearchHandler {
    pub files: Arc<dyn WorkspaceStore>,
}

#[async_trait]
impl ToolHandler for SearchHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let workspace_id = parse_uuid(&params, "workspace_id")?;
        let query = require_str(&params, "query")?;
        let search_type = params
            .get("search_type")
            .and_then(Value::as_str)
            .unwrap_or("content");
        let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(100) as usize;

        let files = self
            .files
            .list_files(ctx.tenant_id, workspace_id)
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?;

        let needle = query.to_lowercase();
        let mut matches = Vec::new();
        for file in &files {
            if matches.len() >= limit {
                break;
            }
            match search_type {
                "path" => {
                    if file.path.to_lowercase().contains(&needle) {
                        matches.push(json!({"file_id": file.id, "path": file.path}));
                    }
                }
                _ => {
                    for (number, line) in file.content.lines().enumerate() {
                        if line.to_lowercase().contains(&needle) {
                            matches.push(json!({
                                "file_id": file.id,
                                "path": file.path,
                                "line": number + 1,
                                "text": line,
                            }));
                            if matches.len() >= limit {
                                break;
                            }
                        }
                    }
                }
            }
        }

        Ok(json!({"matches": matches, "row_count": matches.len()}))
    }
}

// ── Changeset tools ──────────────────────────────────────────────

pub struct ProposePatchHandler {
    pub files: Arc<dyn WorkspaceStore>,
    pub changesets: Arc<dyn ChangesetStore>,
}

#[async_trait]
impl ToolHandler for ProposePatchHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let workspace_id = parse_uuid(&params, "workspace_id")?;
        let file_path = require_str(&params, "file_path")?;
        let unified_diff = require_str(&params, "unified_diff")?;
        let title = require_str(&params, "title")?;
        let rationale = params.get("rationale").and_then(Value::as_str);
        let proposer = actor(ctx)?;

        let outcome = propose_patch(
            self.files.as_ref(),
            self.changesets.as_ref(),
            ctx.tenant_id,
            workspace_id,
            proposer,
            file_path,
            unified_diff,
            title,
            rationale,
        )
        .await
        .map_err(|e| ToolError::Handler(e.to_string()))?;

        Ok(json!({
            "changeset_id": outcome.changeset.id,
            "patch_id": outcome.patch.id,
            "operation": outcome.operation,
            "diff_status": outcome.diff_status,
            "status": outcome.changeset.status,
        }))
    }
}

pub struct ApplyPatchHandler {
    pub files: Arc<dyn WorkspaceStore>,
    pub changesets: Arc<dyn ChangesetStore>,
}

#[async_trait]
impl ToolHandler for ApplyPatchHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let changeset_id = parse_uuid(&params, "changeset_id")?;
        let applier = actor(ctx)?;

        let applied = apply_changeset(
            self.files.as_ref(),
            self.changesets.as_ref(),
            ctx.tenant_id,
            changeset_id,
            applier,
        )
        .await
        .map_err(|e| ToolError::Handler(e.to_string()))?;

        Ok(json!({
            "changeset_id": applied.id,
            "status": applied.status,
            "applied_at": applied.applied_at,
        }))
    }
}

// ── Sandbox run tools ────────────────────────────────────────────

pub struct RunSandboxHandler {
    pub runner: Arc<SandboxRunner>,
    pub run_type: RunType,
}

#[async_trait]
impl ToolHandler for RunSandboxHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let workspace_id = parse_uuid(&params, "workspace_id")?;
        let changeset_id = params
            .get("changeset_id")
            .and_then(Value::as_str)
            .map(Uuid::try_parse)
            .transpose()
            .map_err(|_| ToolError::Handler("Invalid changeset_id".to_string()))?;
        let triggered_by = actor(ctx)?;

        let run = self
            .runner
            .create_run(
                ctx.tenant_id,
                workspace_id,
                self.run_type,
                triggered_by,
                changeset_id,
                &ctx.correlation_id,
            )
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?;

        let finished = self
            .runner
            .execute_run(ctx.tenant_id, run.id)
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?;

        Ok(json!({
            "run_id": finished.id,
            "run_type": finished.run_type,
            "status": finished.status,
            "exit_code": finished.exit_code,
            "duration_ms": finished.duration_ms,
        }))
    }
}

// ── Assertions and deploy ────────────────────────────────────────

pub struct AssertionRunHandler {
    pub deps: GatewayDeps,
}

#[async_trait]
impl ToolHandler for AssertionRunHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let changeset_id = parse_uuid(&params, "changeset_id")?;
        let triggered_by = actor(ctx)?;
        let assertions: Vec<Assertion> = params
            .get("assertions")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ToolError::Handler(format!("Invalid assertions: {}", e)))?
            .ok_or_else(|| ToolError::Handler("Missing required parameter 'assertions'".to_string()))?;

        // The assertion batch borrows the run lifecycle without a
        // subprocess; the changeset links the run to the deploy gate.
        let changeset = self
            .deps
            .changesets
            .get_changeset(ctx.tenant_id, changeset_id)
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?
            .ok_or_else(|| ToolError::Handler("Changeset not found".to_string()))?;

        let run = self
            .deps
            .runner
            .create_run(
                ctx.tenant_id,
                changeset.workspace_id,
                RunType::SuiteqlAssertions,
                triggered_by,
                Some(changeset_id),
                &ctx.correlation_id,
            )
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?;

        let report = execute_assertion_run(
            self.deps.runs.as_ref(),
            self.deps.audit.as_ref(),
            ctx.tenant_id,
            run.id,
            ctx.actor_id,
            &assertions,
            self.deps.executor.as_ref(),
            &self.deps.assertion_allowed_tables,
        )
        .await
        .map_err(|e| ToolError::Handler(e.to_string()))?;

        let mut payload =
            serde_json::to_value(&report).map_err(|e| ToolError::Handler(e.to_string()))?;
        if let Value::Object(map) = &mut payload {
            map.insert("run_id".to_string(), json!(run.id));
        }
        Ok(payload)
    }
}

pub struct DeploySandboxHandler {
    pub deps: GatewayDeps,
}

#[async_trait]
impl ToolHandler for DeploySandboxHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value, ToolError> {
        let changeset_id = parse_uuid(&params, "changeset_id")?;
        let triggered_by = actor(ctx)?;
        let require_assertions = params
            .get("require_assertions")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let override_reason = params.get("override_reason").and_then(Value::as_str);

        let decision = evaluate_deploy_gate(
            self.deps.runs.as_ref(),
            self.deps.audit.as_ref(),
            ctx.tenant_id,
            ctx.actor_id,
            &ctx.correlation_id,
            changeset_id,
            require_assertions,
            override_reason,
        )
        .await
        .map_err(|e| ToolError::Handler(e.to_string()))?;

        if !decision.allowed {
            return Ok(
                serde_json::to_value(&decision).map_err(|e| ToolError::Handler(e.to_string()))?
            );
        }

        let changeset = self
            .deps
            .changesets
            .get_changeset(ctx.tenant_id, changeset_id)
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?
            .ok_or_else(|| ToolError::Handler("Changeset not found".to_string()))?;

        let run = self
            .deps
            .runner
            .create_run(
                ctx.tenant_id,
                changeset.workspace_id,
                RunType::DeploySandbox,
                triggered_by,
                Some(changeset_id),
                &ctx.correlation_id,
            )
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?;

        let finished = self
            .deps
            .runner
            .execute_run(ctx.tenant_id, run.id)
            .await
            .map_err(|e| ToolError::Handler(e.to_string()))?;

        let mut payload =
            serde_json::to_value(&decision).map_err(|e| ToolError::Handler(e.to_string()))?;
        if let Value::Object(map) = &mut payload {
            map.insert("run_id".to_string(), json!(finished.id));
            map.insert("run_status".to_string(), json!(finished.status));
        }
        Ok(payload)
    }
}

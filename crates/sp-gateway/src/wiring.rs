// wiring.rs — Dispatcher assembly.
//
// One call builds the governed tool surface: catalog, registry with the
// core-owned handlers, rate limiter, metrics, and audit sink. The caller
// keeps the returned dispatcher behind an Arc and shares it between the
// agent runner and any direct tool endpoints.

use std::sync::Arc;

use sp_assert::QueryExecutor;
use sp_audit::AuditSink;
use sp_changeset::ChangesetStore;
use sp_sandbox::{RunStore, RunType, SandboxRunner, Subprocess};
use sp_tools::{
    Dispatcher, RateClock, RateLimiter, ToolCatalog, ToolMetrics, ToolRegistry,
};
use sp_workspace::WorkspaceStore;

use crate::handlers::{
    ApplyPatchHandler, AssertionRunHandler, DeploySandboxHandler, HealthHandler,
    ListFilesHandler, ProposePatchHandler, ReadFileHandler, RunSandboxHandler,
    SampleTableHandler, SearchHandler, SuiteqlHandler,
};

/// Everything the gateway handlers need, shared by Arc.
#[derive(Clone)]
pub struct GatewayDeps {
    pub files: Arc<dyn WorkspaceStore>,
    pub changesets: Arc<dyn ChangesetStore>,
    pub runs: Arc<dyn RunStore>,
    pub audit: Arc<dyn AuditSink>,
    pub executor: Arc<dyn QueryExecutor>,
    pub runner: Arc<SandboxRunner>,
    /// Tables assertion queries may reference.
    pub assertion_allowed_tables: Vec<String>,
}

impl GatewayDeps {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        files: Arc<dyn WorkspaceStore>,
        changesets: Arc<dyn ChangesetStore>,
        runs: Arc<dyn RunStore>,
        audit: Arc<dyn AuditSink>,
        executor: Arc<dyn QueryExecutor>,
        subprocess: Arc<dyn Subprocess>,
        assertion_allowed_tables: Vec<String>,
    ) -> Self {
        let runner = Arc::new(SandboxRunner::new(
            Arc::clone(&files),
            Arc::clone(&changesets),
            Arc::clone(&runs),
            Arc::clone(&audit),
            subprocess,
        ));
        Self {
            files,
            changesets,
            runs,
            audit,
            executor,
            runner,
            assertion_allowed_tables,
        }
    }
}

/// Build the governed dispatcher with all core-owned handlers registered.
pub fn build_dispatcher(
    deps: GatewayDeps,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn RateClock>,
    metrics: Arc<ToolMetrics>,
) -> Dispatcher {
    let mut registry = ToolRegistry::new();

    registry.register("health", Arc::new(HealthHandler));
    registry.register(
        "netsuite.suiteql",
        Arc::new(SuiteqlHandler {
            executor: Arc::clone(&deps.executor),
        }),
    );
    registry.register(
        "netsuite.suiteql_stub",
        Arc::new(SuiteqlHandler {
            executor: Arc::clone(&deps.executor),
        }),
    );
    registry.register(
        "data.sample_table_read",
        Arc::new(SampleTableHandler {
            executor: Arc::clone(&deps.executor),
        }),
    );
    registry.register(
        "workspace.list_files",
        Arc::new(ListFilesHandler {
            files: Arc::clone(&deps.files),
        }),
    );
    registry.register(
        "workspace.read_file",
        Arc::new(ReadFileHandler {
            files: Arc::clone(&deps.files),
        }),
    );
    registry.register(
        "workspace.search",
        Arc::new(SearchHandler {
            files: Arc::clone(&deps.files),
        }),
    );
    registry.register(
        "workspace.propose_patch",
        Arc::new(ProposePatchHandler {
            files: Arc::clone(&deps.files),
            changesets: Arc::clone(&deps.changesets),
        }),
    );
    registry.register(
        "workspace.apply_patch",
        Arc::new(ApplyPatchHandler {
            files: Arc::clone(&deps.files),
            changesets: Arc::clone(&deps.changesets),
        }),
    );
    registry.register(
        "workspace.run_validate",
        Arc::new(RunSandboxHandler {
            runner: Arc::clone(&deps.runner),
            run_type: RunType::SdfValidate,
        }),
    );
    registry.register(
        "workspace.run_unit_tests",
        Arc::new(RunSandboxHandler {
            runner: Arc::clone(&deps.runner),
            run_type: RunType::JestUnitTest,
        }),
    );
    registry.register(
        "workspace.run_suiteql_assertions",
        Arc::new(AssertionRunHandler { deps: deps.clone() }),
    );
    registry.register(
        "workspace.deploy_sandbox",
        Arc::new(DeploySandboxHandler { deps: deps.clone() }),
    );

    Dispatcher::new(
        ToolCatalog::new(),
        registry,
        limiter,
        clock,
        metrics,
        deps.audit,
    )
}

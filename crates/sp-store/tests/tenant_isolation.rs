// tenant_isolation.rs — No tenant can observe or mutate another's rows.

use uuid::Uuid;

use sp_audit::{AuditEvent, AuditSink, AuditStatus};
use sp_changeset::{Changeset, ChangesetStore};
use sp_policy::{PolicyProfile, PolicyStore};
use sp_resolver::{EntityMapping, MappingStore};
use sp_sandbox::{Run, RunStore, RunType};
use sp_store::MemoryStore;
use sp_workspace::{Workspace, WorkspaceFile, WorkspaceStore};

#[tokio::test]
async fn workspaces_and_files_are_tenant_scoped() {
    let store = MemoryStore::new();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();
    let owner = Uuid::new_v4();

    let workspace = Workspace::new(tenant_a, "A's workspace", owner);
    let workspace_id = workspace.id;
    store.create_workspace(workspace).await.unwrap();
    store
        .put_file(WorkspaceFile::new_file(
            tenant_a,
            workspace_id,
            "secret.ts",
            "A only",
        ))
        .await
        .unwrap();

    // Tenant B sees nothing, even with the right IDs.
    assert!(store.get_workspace(tenant_b, workspace_id).await.unwrap().is_none());
    assert!(store
        .get_file(tenant_b, workspace_id, "secret.ts")
        .await
        .unwrap()
        .is_none());
    assert!(store.list_files(tenant_b, workspace_id).await.unwrap().is_empty());
    assert!(store
        .most_recent_active_workspace(tenant_b)
        .await
        .unwrap()
        .is_none());

    // Tenant B cannot delete A's file either.
    store.delete_file(tenant_b, workspace_id, "secret.ts").await.unwrap();
    assert!(store
        .get_file(tenant_a, workspace_id, "secret.ts")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn changesets_are_tenant_scoped() {
    let store = MemoryStore::new();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    let cs = Changeset::new(tenant_a, Uuid::new_v4(), "A change", Uuid::new_v4());
    let cs_id = cs.id;
    store.insert_changeset(cs.clone()).await.unwrap();

    assert!(store.get_changeset(tenant_b, cs_id).await.unwrap().is_none());
    assert!(store.get_changeset(tenant_a, cs_id).await.unwrap().is_some());

    // Updating through the wrong tenant fails.
    let mut stolen = cs;
    stolen.tenant_id = tenant_b;
    assert!(store.update_changeset(stolen).await.is_err());

    // The apply lock is also denied without ownership.
    assert!(store.lock_for_apply(tenant_b, cs_id).await.is_err());
}

#[tokio::test]
async fn policies_are_tenant_scoped() {
    let store = MemoryStore::new();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    store
        .save(PolicyProfile::new(tenant_a, "A policy"))
        .await
        .unwrap();

    assert!(store.get_active(tenant_b).await.unwrap().is_none());
    assert!(store.list(tenant_b).await.unwrap().is_empty());
    assert!(store.get_active(tenant_a).await.unwrap().is_some());
}

#[tokio::test]
async fn runs_and_artifacts_are_tenant_scoped() {
    let store = MemoryStore::new();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    let run = Run::new(
        tenant_a,
        Uuid::new_v4(),
        RunType::SdfValidate,
        Uuid::new_v4(),
        "corr",
        "sdf validate",
    );
    let run_id = run.id;
    store.insert_run(run).await.unwrap();

    assert!(store.get_run(tenant_b, run_id).await.unwrap().is_none());
    assert!(store.list_artifacts(tenant_b, run_id).await.unwrap().is_empty());
    assert!(store.get_run(tenant_a, run_id).await.unwrap().is_some());
}

#[tokio::test]
async fn mappings_are_tenant_scoped() {
    let store = MemoryStore::new();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    store
        .upsert_mapping(EntityMapping::new(
            tenant_a,
            "custom_field",
            "custbody_channel",
            "Sales Channel",
        ))
        .await
        .unwrap();

    assert!(store
        .search_similar(tenant_b, "Sales Channel", 5)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store
            .search_similar(tenant_a, "Sales Channel", 5)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn audit_reads_are_tenant_scoped_and_admin_gated() {
    let store = MemoryStore::new();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    store
        .append(AuditEvent::new(
            tenant_a,
            "tool_call",
            "tool.executed",
            "corr-a",
            AuditStatus::Success,
        ))
        .await
        .unwrap();
    store
        .append(AuditEvent::new(
            tenant_b,
            "tool_call",
            "tool.executed",
            "corr-b",
            AuditStatus::Success,
        ))
        .await
        .unwrap();

    assert_eq!(store.audit_events_for_tenant(tenant_a).await.len(), 1);
    assert_eq!(store.audit_events_for_tenant(tenant_b).await.len(), 1);

    // The cross-tenant view requires the explicit capability.
    let admin = store.grant_admin();
    assert_eq!(store.all_audit_events(&admin).await.len(), 2);
}

#[tokio::test]
async fn locked_policy_rejects_overwrite() {
    let store = MemoryStore::new();
    let tenant = Uuid::new_v4();

    let profile = PolicyProfile::new(tenant, "Onboarded");
    let profile_id = profile.id;
    store.save(profile.clone()).await.unwrap();
    store.set_locked(tenant, profile_id, true).await.unwrap();

    let mut updated = profile;
    updated.name = "Edited".to_string();
    assert!(matches!(
        store.save(updated).await,
        Err(sp_policy::PolicyError::ProfileLocked(_))
    ));

    // Unlock, then the edit lands.
    store.set_locked(tenant, profile_id, false).await.unwrap();
    let mut updated = store.get_active(tenant).await.unwrap().unwrap();
    updated.name = "Edited".to_string();
    assert!(store.save(updated).await.is_ok());
}

#[tokio::test]
async fn saving_active_policy_deactivates_previous() {
    let store = MemoryStore::new();
    let tenant = Uuid::new_v4();

    store.save(PolicyProfile::new(tenant, "First")).await.unwrap();
    let mut second = PolicyProfile::new(tenant, "Second");
    second.version = 2;
    store.save(second).await.unwrap();

    let profiles = store.list(tenant).await.unwrap();
    assert_eq!(profiles.len(), 2);
    let active: Vec<_> = profiles.iter().filter(|p| p.is_active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Second");
}

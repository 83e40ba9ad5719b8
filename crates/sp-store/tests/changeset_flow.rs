// changeset_flow.rs — End-to-end changeset behavior over the memory store.

use uuid::Uuid;

use sp_changeset::{
    apply_changeset, changeset_diff_preview, create_unified_diff, propose_patch,
    transition_changeset, ChangesetError, ChangesetState, ChangesetStore, PatchOperation,
    TransitionAction,
};
use sp_store::MemoryStore;
use sp_workspace::{Workspace, WorkspaceError, WorkspaceFile, WorkspaceStore};

struct Fixture {
    store: MemoryStore,
    tenant: Uuid,
    workspace: Uuid,
    user_a: Uuid,
    user_b: Uuid,
}

async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let tenant = Uuid::new_v4();
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    let workspace = Workspace::new(tenant, "SuiteScripts", user_a);
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
        user_a,
        user_b,
    }
}

fn one_to_two_diff() -> String {
    create_unified_diff("const x = 1;\n", "const x = 2;\n")
}

#[tokio::test]
async fn propose_submit_approve_apply_happy_path() {
    let fx = fixture().await;

    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/app.ts",
        &one_to_two_diff(),
        "Bump x",
        Some("x should be 2"),
    )
    .await
    .unwrap();

    assert_eq!(outcome.operation, PatchOperation::Modify);
    assert_eq!(outcome.diff_status, "valid");
    assert_eq!(outcome.preview_modified, "const x = 2;\n");

    // Proposal locked the file for the proposer.
    let file = fx
        .store
        .get_file(fx.tenant, fx.workspace, "src/app.ts")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.locked_by, Some(fx.user_a));

    let cs_id = outcome.changeset.id;
    transition_changeset(
        &fx.store,
        &fx.store,
        fx.tenant,
        cs_id,
        TransitionAction::Submit,
        fx.user_a,
        None,
    )
    .await
    .unwrap();
    transition_changeset(
        &fx.store,
        &fx.store,
        fx.tenant,
        cs_id,
        TransitionAction::Approve,
        fx.user_b,
        None,
    )
    .await
    .unwrap();

    let applied = apply_changeset(&fx.store, &fx.store, fx.tenant, cs_id, fx.user_b)
        .await
        .unwrap();
    assert_eq!(applied.status, ChangesetState::Applied);
    assert_eq!(applied.applied_by, Some(fx.user_b));

    let file = fx
        .store
        .get_file(fx.tenant, fx.workspace, "src/app.ts")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.content, "const x = 2;\n");
    // Apply released the proposal lock.
    assert!(file.locked_by.is_none());
}

#[tokio::test]
async fn concurrent_writer_causes_conflict_and_leaves_file_untouched() {
    let fx = fixture().await;

    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/app.ts",
        &one_to_two_diff(),
        "Bump x",
        None,
    )
    .await
    .unwrap();
    let cs_id = outcome.changeset.id;

    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Submit, fx.user_a, None)
        .await
        .unwrap();
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Approve, fx.user_b, None)
        .await
        .unwrap();

    // Another writer mutates the file before apply.
    let mut drifted = fx
        .store
        .get_file(fx.tenant, fx.workspace, "src/app.ts")
        .await
        .unwrap()
        .unwrap();
    drifted.set_content("const x = 3;\n");
    fx.store.put_file(drifted).await.unwrap();

    let err = apply_changeset(&fx.store, &fx.store, fx.tenant, cs_id, fx.user_b)
        .await
        .unwrap_err();
    assert!(matches!(err, ChangesetError::Conflict { .. }));

    // The file keeps the concurrent writer's content and the changeset
    // stays approved.
    let file = fx
        .store
        .get_file(fx.tenant, fx.workspace, "src/app.ts")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.content, "const x = 3;\n");
    let cs = fx.store.get_changeset(fx.tenant, cs_id).await.unwrap().unwrap();
    assert_eq!(cs.status, ChangesetState::Approved);
}

#[tokio::test]
async fn apply_is_linear_second_attempt_fails() {
    let fx = fixture().await;

    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/app.ts",
        &one_to_two_diff(),
        "Bump x",
        None,
    )
    .await
    .unwrap();
    let cs_id = outcome.changeset.id;

    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Submit, fx.user_a, None)
        .await
        .unwrap();
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Approve, fx.user_b, None)
        .await
        .unwrap();

    apply_changeset(&fx.store, &fx.store, fx.tenant, cs_id, fx.user_b)
        .await
        .unwrap();

    let err = apply_changeset(&fx.store, &fx.store, fx.tenant, cs_id, fx.user_b)
        .await
        .unwrap_err();
    assert!(matches!(err, ChangesetError::NotApproved(ChangesetState::Applied)));
}

#[tokio::test]
async fn foreign_lock_blocks_proposal() {
    let fx = fixture().await;

    propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/app.ts",
        &one_to_two_diff(),
        "First",
        None,
    )
    .await
    .unwrap();

    // A different user proposing against the same file hits the lock.
    let err = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_b,
        "src/app.ts",
        &one_to_two_diff(),
        "Second",
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ChangesetError::Workspace(WorkspaceError::FileLocked { .. })
    ));
}

#[tokio::test]
async fn rejection_releases_file_locks() {
    let fx = fixture().await;

    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/app.ts",
        &one_to_two_diff(),
        "Bump x",
        None,
    )
    .await
    .unwrap();
    let cs_id = outcome.changeset.id;

    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Submit, fx.user_a, None)
        .await
        .unwrap();
    let rejected = transition_changeset(
        &fx.store,
        &fx.store,
        fx.tenant,
        cs_id,
        TransitionAction::Reject,
        fx.user_b,
        Some("not needed"),
    )
    .await
    .unwrap();
    assert_eq!(rejected.status, ChangesetState::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("not needed"));

    let file = fx
        .store
        .get_file(fx.tenant, fx.workspace, "src/app.ts")
        .await
        .unwrap()
        .unwrap();
    assert!(file.locked_by.is_none());

    // User B can now propose freely.
    assert!(propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_b,
        "src/app.ts",
        &one_to_two_diff(),
        "Retry",
        None,
    )
    .await
    .is_ok());
}

#[tokio::test]
async fn invalid_transitions_are_rejected() {
    let fx = fixture().await;

    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/app.ts",
        &one_to_two_diff(),
        "Bump x",
        None,
    )
    .await
    .unwrap();
    let cs_id = outcome.changeset.id;

    // Approve straight from draft is not in the table.
    let err = transition_changeset(
        &fx.store,
        &fx.store,
        fx.tenant,
        cs_id,
        TransitionAction::Approve,
        fx.user_b,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ChangesetError::InvalidTransition { .. }));

    // Apply is never accepted through the transition entry point.
    let err = transition_changeset(
        &fx.store,
        &fx.store,
        fx.tenant,
        cs_id,
        TransitionAction::Apply,
        fx.user_b,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ChangesetError::InvalidTransition { .. }));
}

#[tokio::test]
async fn concurrent_apply_loser_fails_fast() {
    let fx = fixture().await;

    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/app.ts",
        &one_to_two_diff(),
        "Bump x",
        None,
    )
    .await
    .unwrap();
    let cs_id = outcome.changeset.id;

    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Submit, fx.user_a, None)
        .await
        .unwrap();
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Approve, fx.user_b, None)
        .await
        .unwrap();

    // Simulate a concurrent apply holding the row lock.
    let guard = fx.store.lock_for_apply(fx.tenant, cs_id).await.unwrap();
    let err = apply_changeset(&fx.store, &fx.store, fx.tenant, cs_id, fx.user_b)
        .await
        .unwrap_err();
    assert!(matches!(err, ChangesetError::ApplyLockBusy));

    drop(guard);
    assert!(apply_changeset(&fx.store, &fx.store, fx.tenant, cs_id, fx.user_b)
        .await
        .is_ok());
}

#[tokio::test]
async fn create_proposal_and_preview() {
    let fx = fixture().await;

    let diff = create_unified_diff("", "export const fresh = true;\n");
    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/fresh.ts",
        &diff,
        "Add fresh module",
        None,
    )
    .await
    .unwrap();
    assert_eq!(outcome.operation, PatchOperation::Create);
    assert!(outcome.patch.baseline_sha256.is_empty());

    let previews = changeset_diff_preview(&fx.store, &fx.store, fx.tenant, outcome.changeset.id)
        .await
        .unwrap();
    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0].original_content, "");
    assert_eq!(previews[0].modified_content, "export const fresh = true;\n");
}

#[tokio::test]
async fn diff_round_trip_restores_original() {
    let fx = fixture().await;
    let original = "const x = 1;\n";
    let modified = "const x = 2;\n";

    // Forward apply.
    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/app.ts",
        &create_unified_diff(original, modified),
        "Forward",
        None,
    )
    .await
    .unwrap();
    let cs_id = outcome.changeset.id;
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Submit, fx.user_a, None)
        .await
        .unwrap();
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Approve, fx.user_b, None)
        .await
        .unwrap();
    apply_changeset(&fx.store, &fx.store, fx.tenant, cs_id, fx.user_b)
        .await
        .unwrap();

    // Inverse apply restores the original content.
    let outcome = propose_patch(
        &fx.store,
        &fx.store,
        fx.tenant,
        fx.workspace,
        fx.user_a,
        "src/app.ts",
        &create_unified_diff(modified, original),
        "Inverse",
        None,
    )
    .await
    .unwrap();
    let cs_id = outcome.changeset.id;
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Submit, fx.user_a, None)
        .await
        .unwrap();
    transition_changeset(&fx.store, &fx.store, fx.tenant, cs_id, TransitionAction::Approve, fx.user_b, None)
        .await
        .unwrap();
    apply_changeset(&fx.store, &fx.store, fx.tenant, cs_id, fx.user_b)
        .await
        .unwrap();

    let file = fx
        .store
        .get_file(fx.tenant, fx.workspace, "src/app.ts")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.content, original);
    assert_eq!(file.sha256_hash, sp_workspace::file::content_hash(original));
}

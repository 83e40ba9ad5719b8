// ops.rs — Proposal, transition, and apply flows.
//
// These functions hold the cross-entity logic: proposal acquires the
// advisory file lock and snapshots the baseline hash, transitions follow
// the fixed table and release locks on rejection, and apply verifies every
// baseline before mutating anything so a conflict rolls the whole
// changeset back.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use sp_workspace::file::content_hash;
use sp_workspace::{validate_path, WorkspaceError, WorkspaceFile, WorkspaceStore};

use crate::changeset::Changeset;
use crate::diff::{apply_unified_diff, MAX_DIFF_SIZE};
use crate::error::ChangesetError;
use crate::patch::{Patch, PatchOperation};
use crate::state::{next_state, ChangesetState, TransitionAction};
use crate::store::ChangesetStore;

/// Result of proposing a patch: the draft changeset, its patch, and a
/// before/after preview for review surfaces.
#[derive(Debug, Clone)]
pub struct ProposalOutcome {
    pub changeset: Changeset,
    pub patch: Patch,
    pub operation: PatchOperation,
    /// "valid" or a parse-error description for modify diffs that will
    /// need replacement content before apply.
    pub diff_status: String,
    pub preview_original: String,
    pub preview_modified: String,
}

/// Per-file before/after view of a changeset.
#[derive(Debug, Clone)]
pub struct FileDiffPreview {
    pub file_path: String,
    pub operation: PatchOperation,
    pub original_content: String,
    pub modified_content: String,
}

/// Propose a single-file change as a new draft changeset.
///
/// Acquires (or renews) the advisory lock on an existing target; a foreign
/// unexpired lock fails the proposal. The operation is `create` when the
/// file does not exist, otherwise `modify` with the current content hash
/// as baseline.
#[allow(clippy::too_many_arguments)]
pub async fn propose_patch(
    files: &dyn WorkspaceStore,
    changesets: &dyn ChangesetStore,
    tenant_id: Uuid,
    workspace_id: Uuid,
    proposed_by: Uuid,
    file_path: &str,
    unified_diff: &str,
    title: &str,
    rationale: Option<&str>,
) -> Result<ProposalOutcome, ChangesetError> {
    let path = validate_path(file_path)?;

    if unified_diff.len() > MAX_DIFF_SIZE {
        return Err(ChangesetError::DiffTooLarge { max: MAX_DIFF_SIZE });
    }

    let now = Utc::now();
    let existing = files.get_file(tenant_id, workspace_id, &path).await?;

    let (operation, baseline) = match &existing {
        Some(file) => {
            if file.is_locked_by_other(proposed_by, now) {
                return Err(WorkspaceError::FileLocked { path }.into());
            }
            let mut locked = file.clone();
            locked.acquire_lock(proposed_by, now);
            files.put_file(locked).await?;
            (PatchOperation::Modify, file.sha256_hash.clone())
        }
        None => (PatchOperation::Create, String::new()),
    };

    let preview_original = existing.as_ref().map(|f| f.content.clone()).unwrap_or_default();
    let (preview_modified, diff_status) =
        match apply_unified_diff(&preview_original, unified_diff, &path) {
            Ok(modified) => (modified, "valid".to_string()),
            Err(err) => {
                // A create patch has nothing to fall back on; a modify
                // patch keeps the diff and is previewed as unchanged.
                if operation == PatchOperation::Create {
                    return Err(err);
                }
                warn!(path = %path, error = %err, "diff preview failed");
                (preview_original.clone(), format!("parse_error: {}", err))
            }
        };

    let mut changeset = Changeset::new(tenant_id, workspace_id, title, proposed_by);
    if let Some(rationale) = rationale {
        changeset = changeset.with_description(rationale);
    }

    let patch = match operation {
        PatchOperation::Create => Patch::create(
            tenant_id,
            changeset.id,
            path.clone(),
            preview_modified.clone(),
            0,
        ),
        _ => Patch::modify(
            tenant_id,
            changeset.id,
            path.clone(),
            baseline,
            unified_diff,
            0,
        ),
    };

    changesets.insert_changeset(changeset.clone()).await?;
    changesets.insert_patch(patch.clone()).await?;

    info!(
        changeset_id = %changeset.id,
        path = %path,
        operation = ?operation,
        "patch proposed"
    );

    Ok(ProposalOutcome {
        changeset,
        patch,
        operation,
        diff_status,
        preview_original,
        preview_modified,
    })
}

/// Move a changeset through the review table.
///
/// `Apply` is not accepted here: applying has side effects on files and
/// goes through [`apply_changeset`]. Transitions into `rejected` release
/// every file lock held by the changeset's patches.
pub async fn transition_changeset(
    files: &dyn WorkspaceStore,
    changesets: &dyn ChangesetStore,
    tenant_id: Uuid,
    changeset_id: Uuid,
    action: TransitionAction,
    actor_id: Uuid,
    rejection_reason: Option<&str>,
) -> Result<Changeset, ChangesetError> {
    let mut cs = changesets
        .get_changeset(tenant_id, changeset_id)
        .await?
        .ok_or(ChangesetError::NotFound)?;

    if action == TransitionAction::Apply {
        return Err(ChangesetError::InvalidTransition {
            from: cs.status,
            action,
        });
    }

    let new_state = next_state(cs.status, action).ok_or(ChangesetError::InvalidTransition {
        from: cs.status,
        action,
    })?;

    let now = Utc::now();
    cs.status = new_state;
    match action {
        TransitionAction::Submit => cs.submitted_at = Some(now),
        TransitionAction::Approve | TransitionAction::Reject => {
            cs.reviewed_by = Some(actor_id);
            cs.reviewed_at = Some(now);
            if action == TransitionAction::Reject {
                cs.rejection_reason = rejection_reason.map(str::to_string);
            }
        }
        _ => {}
    }

    if new_state == ChangesetState::Rejected {
        release_file_locks(files, changesets, tenant_id, &cs).await?;
    }

    changesets.update_changeset(cs.clone()).await?;
    info!(changeset_id = %cs.id, action = %action, status = %cs.status, "changeset transition");
    Ok(cs)
}

/// Apply an approved changeset to its workspace files.
///
/// All patches are validated and their resulting contents computed before
/// any file is written, so a baseline conflict or a non-applying diff
/// leaves every file untouched. Concurrent applies of the same changeset
/// contend on the store's row lock; the loser fails fast.
pub async fn apply_changeset(
    files: &dyn WorkspaceStore,
    changesets: &dyn ChangesetStore,
    tenant_id: Uuid,
    changeset_id: Uuid,
    actor_id: Uuid,
) -> Result<Changeset, ChangesetError> {
    let _guard = changesets.lock_for_apply(tenant_id, changeset_id).await?;

    let mut cs = changesets
        .get_changeset(tenant_id, changeset_id)
        .await?
        .ok_or(ChangesetError::NotFound)?;

    if cs.status != ChangesetState::Approved {
        return Err(ChangesetError::NotApproved(cs.status));
    }

    let patches = changesets.list_patches(tenant_id, changeset_id).await?;

    enum Mutation {
        Put(WorkspaceFile),
        Delete(String),
    }

    // Phase one: validate everything and compute resulting contents.
    let mut mutations = Vec::with_capacity(patches.len());
    for patch in &patches {
        let path = validate_path(&patch.file_path)?;
        match patch.operation {
            PatchOperation::Create => {
                let content = patch.new_content.clone().unwrap_or_default();
                mutations.push(Mutation::Put(WorkspaceFile::new_file(
                    tenant_id,
                    cs.workspace_id,
                    path,
                    content,
                )));
            }
            PatchOperation::Delete => {
                if files.get_file(tenant_id, cs.workspace_id, &path).await?.is_some() {
                    mutations.push(Mutation::Delete(path));
                }
            }
            PatchOperation::Modify => {
                let file = files
                    .get_file(tenant_id, cs.workspace_id, &path)
                    .await?
                    .ok_or_else(|| ChangesetError::ModifyTargetMissing { path: path.clone() })?;

                if file.sha256_hash != patch.baseline_sha256 {
                    return Err(ChangesetError::Conflict { path });
                }

                let new_content = if let Some(diff) = &patch.unified_diff {
                    apply_unified_diff(&file.content, diff, &path)?
                } else if let Some(content) = &patch.new_content {
                    content.clone()
                } else {
                    return Err(ChangesetError::EmptyModify { path });
                };

                debug_assert_eq!(file.sha256_hash, content_hash(&file.content));
                let mut updated = file;
                updated.set_content(new_content);
                // The proposal lock is released as part of the same write.
                updated.release_lock();
                mutations.push(Mutation::Put(updated));
            }
        }
    }

    // Phase two: write. Validation is complete, so every mutation lands.
    for mutation in mutations {
        match mutation {
            Mutation::Put(file) => files.put_file(file).await?,
            Mutation::Delete(path) => files.delete_file(tenant_id, cs.workspace_id, &path).await?,
        }
    }

    cs.status = ChangesetState::Applied;
    cs.applied_by = Some(actor_id);
    cs.applied_at = Some(Utc::now());
    changesets.update_changeset(cs.clone()).await?;

    info!(changeset_id = %cs.id, patches = patches.len(), "changeset applied");
    Ok(cs)
}

/// Per-file before/after contents for a changeset, for review surfaces.
///
/// A modify diff that no longer applies previews as unchanged rather than
/// failing the whole view.
pub async fn changeset_diff_preview(
    files: &dyn WorkspaceStore,
    changesets: &dyn ChangesetStore,
    tenant_id: Uuid,
    changeset_id: Uuid,
) -> Result<Vec<FileDiffPreview>, ChangesetError> {
    let cs = changesets
        .get_changeset(tenant_id, changeset_id)
        .await?
        .ok_or(ChangesetError::NotFound)?;
    let patches = changesets.list_patches(tenant_id, changeset_id).await?;

    let mut previews = Vec::with_capacity(patches.len());
    for patch in patches {
        let original = match patch.operation {
            PatchOperation::Create => String::new(),
            _ => files
                .get_file(tenant_id, cs.workspace_id, &patch.file_path)
                .await?
                .map(|f| f.content)
                .unwrap_or_default(),
        };

        let modified = match patch.operation {
            PatchOperation::Create => patch.new_content.clone().unwrap_or_default(),
            PatchOperation::Delete => String::new(),
            PatchOperation::Modify => match &patch.unified_diff {
                Some(diff) => apply_unified_diff(&original, diff, &patch.file_path)
                    .unwrap_or_else(|_| original.clone()),
                None => patch.new_content.clone().unwrap_or_else(|| original.clone()),
            },
        };

        previews.push(FileDiffPreview {
            file_path: patch.file_path,
            operation: patch.operation,
            original_content: original,
            modified_content: modified,
        });
    }

    Ok(previews)
}

async fn release_file_locks(
    files: &dyn WorkspaceStore,
    changesets: &dyn ChangesetStore,
    tenant_id: Uuid,
    cs: &Changeset,
) -> Result<(), ChangesetError> {
    for patch in changesets.list_patches(tenant_id, cs.id).await? {
        if let Some(mut file) = files
            .get_file(tenant_id, cs.workspace_id, &patch.file_path)
            .await?
        {
            if file.locked_by.is_some() {
                file.release_lock();
                files.put_file(file).await?;
            }
        }
    }
    Ok(())
}

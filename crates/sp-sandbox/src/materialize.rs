// materialize.rs — Workspace snapshot materialization.
//
// A snapshot is the workspace's non-directory files as a path → content
// map, optionally overlaid with an approved changeset's patches. Writing
// the snapshot to disk resolves every target inside the scratch root and
// refuses anything that would land outside it.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use sp_changeset::diff::apply_unified_diff;
use sp_changeset::{ChangesetState, ChangesetStore, PatchOperation};
use sp_workspace::file::content_hash;
use sp_workspace::{validate_path, WorkspaceStore};

use crate::error::SandboxError;

/// Path → content for all regular files in a workspace.
pub async fn load_snapshot(
    files: &dyn WorkspaceStore,
    tenant_id: Uuid,
    workspace_id: Uuid,
) -> Result<BTreeMap<String, String>, SandboxError> {
    let mut snapshot = BTreeMap::new();
    for file in files.list_files(tenant_id, workspace_id).await? {
        if !file.is_directory {
            snapshot.insert(file.path, file.content);
        }
    }
    Ok(snapshot)
}

/// Overlay an approved changeset's patches onto a snapshot, in
/// `apply_order`, verifying modify baselines against the snapshot.
pub async fn apply_changeset_overlay(
    changesets: &dyn ChangesetStore,
    tenant_id: Uuid,
    changeset_id: Uuid,
    snapshot: &mut BTreeMap<String, String>,
) -> Result<(), SandboxError> {
    let changeset = changesets
        .get_changeset(tenant_id, changeset_id)
        .await?
        .ok_or(SandboxError::ChangesetMissing)?;

    if changeset.status != ChangesetState::Approved {
        return Err(SandboxError::ChangesetNotApproved(
            changeset.status.to_string(),
        ));
    }

    for patch in changesets.list_patches(tenant_id, changeset_id).await? {
        let path = validate_path(&patch.file_path)?;
        match patch.operation {
            PatchOperation::Create => {
                snapshot.insert(path, patch.new_content.unwrap_or_default());
            }
            PatchOperation::Delete => {
                snapshot.remove(&path);
            }
            PatchOperation::Modify => {
                let original = snapshot
                    .get(&path)
                    .cloned()
                    .ok_or_else(|| SandboxError::SnapshotTargetMissing { path: path.clone() })?;

                if !patch.baseline_sha256.is_empty()
                    && content_hash(&original) != patch.baseline_sha256
                {
                    return Err(SandboxError::BaselineMismatch { path });
                }

                let modified = if let Some(diff) = &patch.unified_diff {
                    apply_unified_diff(&original, diff, &path)?
                } else if let Some(content) = &patch.new_content {
                    content.clone()
                } else {
                    return Err(SandboxError::SnapshotTargetMissing { path });
                };
                snapshot.insert(path, modified);
            }
        }
    }

    Ok(())
}

/// Resolve a snapshot path inside the scratch root, rejecting anything
/// that would escape it.
pub fn safe_target_path(scratch_root: &Path, relative: &str) -> Result<PathBuf, SandboxError> {
    let normalized = validate_path(relative)?;
    let candidate = scratch_root.join(&normalized);

    // validate_path already forbids traversal segments and absolute
    // prefixes; verify the joined result anyway before touching disk.
    let escapes = candidate
        .components()
        .any(|c| matches!(c, Component::ParentDir))
        || !candidate.starts_with(scratch_root);
    if escapes {
        return Err(SandboxError::PathEscape {
            path: relative.to_string(),
        });
    }

    Ok(candidate)
}

/// Write a snapshot into the scratch directory. Returns the file count.
pub fn write_snapshot(
    scratch_root: &Path,
    snapshot: &BTreeMap<String, String>,
) -> Result<usize, SandboxError> {
    for (path, content) in snapshot {
        let target = safe_target_path(scratch_root, path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content)?;
    }
    Ok(snapshot.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn safe_target_stays_under_root() {
        let dir = tempdir().unwrap();
        let target = safe_target_path(dir.path(), "src/app.ts").unwrap();
        assert!(target.starts_with(dir.path()));
    }

    #[test]
    fn traversal_is_rejected() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            safe_target_path(dir.path(), "../outside.txt"),
            Err(SandboxError::Workspace(_))
        ));
        assert!(matches!(
            safe_target_path(dir.path(), "a/../../outside.txt"),
            Err(SandboxError::Workspace(_))
        ));
    }

    #[test]
    fn write_snapshot_creates_nested_files() {
        let dir = tempdir().unwrap();
        let mut snapshot = BTreeMap::new();
        snapshot.insert("src/lib/mod.ts".to_string(), "export {};\n".to_string());
        snapshot.insert("README.md".to_string(), "hi\n".to_string());

        let count = write_snapshot(dir.path(), &snapshot).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/lib/mod.ts")).unwrap(),
            "export {};\n"
        );
    }
}

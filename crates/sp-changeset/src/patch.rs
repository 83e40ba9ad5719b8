// patch.rs — A single file operation inside a changeset.
//
// Modify patches carry either a unified diff or full replacement content;
// create patches carry content only; delete patches carry neither. The
// baseline hash records the content the patch was proposed against, and
// is the empty string for create operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a patch does to its target file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatchOperation {
    Create,
    Modify,
    Delete,
}

/// One file-level operation owned by a changeset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub changeset_id: Uuid,
    pub operation: PatchOperation,
    pub file_path: String,

    /// SHA-256 of the pre-change content; empty for create.
    pub baseline_sha256: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_diff: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,

    /// Position in the changeset's apply sequence.
    pub apply_order: u32,
}

impl Patch {
    pub fn create(
        tenant_id: Uuid,
        changeset_id: Uuid,
        file_path: impl Into<String>,
        new_content: impl Into<String>,
        apply_order: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            changeset_id,
            operation: PatchOperation::Create,
            file_path: file_path.into(),
            baseline_sha256: String::new(),
            unified_diff: None,
            new_content: Some(new_content.into()),
            apply_order,
        }
    }

    pub fn modify(
        tenant_id: Uuid,
        changeset_id: Uuid,
        file_path: impl Into<String>,
        baseline_sha256: impl Into<String>,
        unified_diff: impl Into<String>,
        apply_order: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            changeset_id,
            operation: PatchOperation::Modify,
            file_path: file_path.into(),
            baseline_sha256: baseline_sha256.into(),
            unified_diff: Some(unified_diff.into()),
            new_content: None,
            apply_order,
        }
    }

    pub fn delete(
        tenant_id: Uuid,
        changeset_id: Uuid,
        file_path: impl Into<String>,
        baseline_sha256: impl Into<String>,
        apply_order: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            changeset_id,
            operation: PatchOperation::Delete,
            file_path: file_path.into(),
            baseline_sha256: baseline_sha256.into(),
            unified_diff: None,
            new_content: None,
            apply_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_patch_has_empty_baseline() {
        let patch = Patch::create(Uuid::new_v4(), Uuid::new_v4(), "a.ts", "content", 0);
        assert_eq!(patch.operation, PatchOperation::Create);
        assert!(patch.baseline_sha256.is_empty());
        assert!(patch.unified_diff.is_none());
        assert_eq!(patch.new_content.as_deref(), Some("content"));
    }

    #[test]
    fn delete_patch_carries_neither_diff_nor_content() {
        let patch = Patch::delete(Uuid::new_v4(), Uuid::new_v4(), "a.ts", "abc", 1);
        assert!(patch.unified_diff.is_none());
        assert!(patch.new_content.is_none());
    }

    #[test]
    fn operation_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PatchOperation::Modify).unwrap(),
            "\"modify\""
        );
    }
}

// diff.rs — Unified-diff parsing and application.
//
// Wraps diffy so the rest of the crate deals in crate-local errors.
// Application is line-accurate across multiple hunks and preserves
// trailing-newline state; a context mismatch is reported as
// PatchDoesNotApply so the caller can roll back the whole apply.

use crate::error::ChangesetError;

/// Maximum accepted diff size in bytes.
pub const MAX_DIFF_SIZE: usize = 256 * 1024;

/// Apply a unified diff to `original`, returning the patched content.
pub fn apply_unified_diff(
    original: &str,
    unified_diff: &str,
    file_path: &str,
) -> Result<String, ChangesetError> {
    if unified_diff.len() > MAX_DIFF_SIZE {
        return Err(ChangesetError::DiffTooLarge { max: MAX_DIFF_SIZE });
    }

    let patch = diffy::Patch::from_str(unified_diff)
        .map_err(|e| ChangesetError::DiffParse(e.to_string()))?;

    diffy::apply(original, &patch).map_err(|e| ChangesetError::PatchDoesNotApply {
        path: file_path.to_string(),
        reason: e.to_string(),
    })
}

/// Produce a unified diff transforming `original` into `modified`.
pub fn create_unified_diff(original: &str, modified: &str) -> String {
    diffy::create_patch(original, modified).to_string()
}

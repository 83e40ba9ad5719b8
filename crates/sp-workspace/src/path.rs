// path.rs — Virtual path validation.
//
// Every path entering the system (file upsert, patch proposal, snapshot
// materialization) passes through `validate_path`. The rules are strict:
// relative only, no traversal segments, at most 512 bytes and 20 segments,
// characters limited to [A-Za-z0-9_./ -].

use crate::error::WorkspaceError;

/// Maximum path length in bytes.
pub const MAX_PATH_LENGTH: usize = 512;

/// Maximum number of path segments.
pub const MAX_PATH_DEPTH: usize = 20;

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | ' ' | '-')
}

/// Validate and normalize a virtual file path.
///
/// Normalization collapses repeated separators and drops `.` segments;
/// the returned path is the canonical storage key.
pub fn validate_path(path: &str) -> Result<String, WorkspaceError> {
    if path.is_empty() || path.len() > MAX_PATH_LENGTH {
        return Err(WorkspaceError::InvalidPath(format!(
            "path must be 1-{} bytes",
            MAX_PATH_LENGTH
        )));
    }

    if path.starts_with('/') {
        return Err(WorkspaceError::InvalidPath(
            "absolute paths are not allowed".to_string(),
        ));
    }

    if let Some(bad) = path.chars().find(|c| !is_allowed_char(*c)) {
        return Err(WorkspaceError::InvalidPath(format!(
            "path contains disallowed character {:?}",
            bad
        )));
    }

    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if segments.is_empty() {
        return Err(WorkspaceError::InvalidPath("path has no segments".to_string()));
    }

    if segments.contains(&"..") {
        return Err(WorkspaceError::InvalidPath(
            "path traversal sequences ('..') are not allowed".to_string(),
        ));
    }

    if segments.len() > MAX_PATH_DEPTH {
        return Err(WorkspaceError::InvalidPath(format!(
            "path exceeds maximum depth of {}",
            MAX_PATH_DEPTH
        )));
    }

    Ok(segments.join("/"))
}

/// The final segment of a validated path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// file.rs — Workspace and WorkspaceFile entities.
//
// Files are stored as text with a SHA-256 of their content; the hash is
// the baseline for changeset conflict detection. File locks are advisory:
// they are acquired during patch proposal, checked on every subsequent
// proposal, and expire after thirty minutes of inactivity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::path::file_name;

/// How long an advisory file lock survives without renewal.
pub const LOCK_EXPIRY: Duration = Duration::minutes(30);

/// Lifecycle status of a workspace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    Active,
    Archived,
}

/// A named, tenant-owned container of files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: WorkspaceStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    pub fn new(tenant_id: Uuid, name: impl Into<String>, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.into(),
            description: None,
            status: WorkspaceStatus::Active,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// One file (or directory marker) inside a workspace.
///
/// `(workspace_id, path)` is unique. Directory entries carry no content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceFile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub workspace_id: Uuid,
    pub path: String,
    pub file_name: String,
    pub content: String,
    pub sha256_hash: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SHA-256 of file content, lowercase hex.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Best-effort MIME type from the file extension.
pub fn guess_mime(path: &str) -> Option<String> {
    let ext = path.rsplit('.').next()?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "js" => "application/javascript",
        "ts" => "application/typescript",
        "json" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime.to_string())
}

impl WorkspaceFile {
    /// Create a file entry, computing hash, size, and MIME type.
    pub fn new_file(
        tenant_id: Uuid,
        workspace_id: Uuid,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let content = content.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            workspace_id,
            file_name: file_name(&path).to_string(),
            sha256_hash: content_hash(&content),
            size_bytes: content.len() as u64,
            mime_type: guess_mime(&path),
            path,
            content,
            is_directory: false,
            locked_by: None,
            locked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a directory marker entry.
    pub fn new_directory(tenant_id: Uuid, workspace_id: Uuid, path: impl Into<String>) -> Self {
        let path = path.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            workspace_id,
            file_name: file_name(&path).to_string(),
            sha256_hash: String::new(),
            size_bytes: 0,
            mime_type: None,
            path,
            content: String::new(),
            is_directory: true,
            locked_by: None,
            locked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace content, refreshing hash, size, and timestamp.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.sha256_hash = content_hash(&self.content);
        self.size_bytes = self.content.len() as u64;
        self.updated_at = Utc::now();
    }

    /// Whether the lock, if any, has outlived [`LOCK_EXPIRY`].
    pub fn is_lock_expired(&self, now: DateTime<Utc>) -> bool {
        match self.locked_at {
            Some(locked_at) => now - locked_at > LOCK_EXPIRY,
            None => true,
        }
    }

    /// Whether a different user holds an unexpired lock.
    pub fn is_locked_by_other(&self, user: Uuid, now: DateTime<Utc>) -> bool {
        match self.locked_by {
            Some(owner) => owner != user && !self.is_lock_expired(now),
            None => false,
        }
    }

    /// Take (or renew) the advisory lock for a user.
    pub fn acquire_lock(&mut self, user: Uuid, now: DateTime<Utc>) {
        self.locked_by = Some(user);
        self.locked_at = Some(now);
    }

    /// Drop the advisory lock.
    pub fn release_lock(&mut self) {
        self.locked_by = None;
        self.locked_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_file_computes_hash_and_size() {
        let file = WorkspaceFile::new_file(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "src/app.ts",
            "const x = 1;\n",
        );
        assert_eq!(file.file_name, "app.ts");
        assert_eq!(file.size_bytes, 13);
        assert_eq!(file.sha256_hash, content_hash("const x = 1;\n"));
        assert_eq!(file.mime_type.as_deref(), Some("application/typescript"));
        assert!(!file.is_directory);
    }

    #[test]
    fn set_content_refreshes_hash() {
        let mut file =
            WorkspaceFile::new_file(Uuid::new_v4(), Uuid::new_v4(), "a.txt", "one");
        let before = file.sha256_hash.clone();
        file.set_content("two");
        assert_ne!(file.sha256_hash, before);
        assert_eq!(file.size_bytes, 3);
    }

    #[test]
    fn lock_expiry_after_thirty_minutes() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut file =
            WorkspaceFile::new_file(Uuid::new_v4(), Uuid::new_v4(), "a.txt", "x");

        let t0 = Utc::now();
        file.acquire_lock(user, t0);

        assert!(file.is_locked_by_other(other, t0 + Duration::minutes(29)));
        assert!(!file.is_locked_by_other(other, t0 + Duration::minutes(31)));
        // The owner is never locked out by their own lock.
        assert!(!file.is_locked_by_other(user, t0));
    }

    #[test]
    fn release_clears_lock_state() {
        let mut file =
            WorkspaceFile::new_file(Uuid::new_v4(), Uuid::new_v4(), "a.txt", "x");
        file.acquire_lock(Uuid::new_v4(), Utc::now());
        file.release_lock();
        assert!(file.locked_by.is_none());
        assert!(file.locked_at.is_none());
    }

    #[test]
    fn directory_marker_has_no_content() {
        let dir = WorkspaceFile::new_directory(Uuid::new_v4(), Uuid::new_v4(), "src/lib");
        assert!(dir.is_directory);
        assert_eq!(dir.size_bytes, 0);
        assert!(dir.content.is_empty());
    }
}

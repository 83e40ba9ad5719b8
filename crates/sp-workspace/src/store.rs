// store.rs — The WorkspaceStore capability.
//
// All reads and writes are tenant-scoped: a call bearing tenant A's ID can
// never observe tenant B's rows. Implementations supply row-level locking
// semantics for `get_file`; in the SQL deployment that is SELECT ... FOR
// UPDATE, in the in-memory store it is a plain read inside the store lock.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::WorkspaceError;
use crate::file::{Workspace, WorkspaceFile};

/// Persistence for workspaces and their files.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    async fn create_workspace(&self, workspace: Workspace) -> Result<(), WorkspaceError>;

    async fn get_workspace(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Option<Workspace>, WorkspaceError>;

    /// The tenant's most recently created active workspace. Used to
    /// backfill a missing `workspace_id` in agent tool calls.
    async fn most_recent_active_workspace(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<Workspace>, WorkspaceError>;

    /// All non-directory files in a workspace.
    async fn list_files(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<WorkspaceFile>, WorkspaceError>;

    async fn get_file(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
        path: &str,
    ) -> Result<Option<WorkspaceFile>, WorkspaceError>;

    /// Insert or replace a file keyed by `(workspace_id, path)`.
    async fn put_file(&self, file: WorkspaceFile) -> Result<(), WorkspaceError>;

    /// Remove a file. Missing files are not an error.
    async fn delete_file(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
        path: &str,
    ) -> Result<(), WorkspaceError>;
}

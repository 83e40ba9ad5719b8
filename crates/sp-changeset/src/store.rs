// store.rs — The ChangesetStore capability.
//
// Changesets and their patches persist through this trait. `lock_for_apply`
// models the row-level lock taken during apply: exactly one caller holds
// the returned guard at a time and a concurrent caller fails fast with
// a busy error rather than waiting.

use async_trait::async_trait;
use uuid::Uuid;

use crate::changeset::Changeset;
use crate::error::ChangesetError;
use crate::patch::Patch;

/// Exclusive hold on a changeset row during apply. Dropping the guard
/// releases the lock.
pub trait ApplyGuard: Send {}

/// Persistence for changesets and patches.
#[async_trait]
pub trait ChangesetStore: Send + Sync {
    async fn insert_changeset(&self, changeset: Changeset) -> Result<(), ChangesetError>;

    async fn get_changeset(
        &self,
        tenant_id: Uuid,
        changeset_id: Uuid,
    ) -> Result<Option<Changeset>, ChangesetError>;

    /// Persist updated changeset fields (status, reviewers, timestamps).
    async fn update_changeset(&self, changeset: Changeset) -> Result<(), ChangesetError>;

    /// Changesets for a workspace, newest first.
    async fn list_changesets(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<Changeset>, ChangesetError>;

    async fn insert_patch(&self, patch: Patch) -> Result<(), ChangesetError>;

    /// Patches for a changeset ordered by `apply_order`.
    async fn list_patches(
        &self,
        tenant_id: Uuid,
        changeset_id: Uuid,
    ) -> Result<Vec<Patch>, ChangesetError>;

    /// Take the apply lock for a changeset, failing with
    /// [`ChangesetError::ApplyLockBusy`] when another apply holds it.
    async fn lock_for_apply(
        &self,
        tenant_id: Uuid,
        changeset_id: Uuid,
    ) -> Result<Box<dyn ApplyGuard>, ChangesetError>;
}

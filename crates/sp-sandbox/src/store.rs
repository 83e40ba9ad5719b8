// store.rs — The RunStore capability.
//
// Runs and artifacts persist through this trait. Artifacts are insert-only;
// runs accept updates until they reach a terminal state, after which the
// store rejects further mutation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::artifact::Artifact;
use crate::error::SandboxError;
use crate::run::{Run, RunStatus, RunType};

/// Persistence for runs and their artifacts.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn insert_run(&self, run: Run) -> Result<(), SandboxError>;

    async fn get_run(&self, tenant_id: Uuid, run_id: Uuid) -> Result<Option<Run>, SandboxError>;

    /// Persist updated run fields. Fails once the stored run is terminal.
    async fn update_run(&self, run: Run) -> Result<(), SandboxError>;

    /// The most recent run of a type for a changeset with the given
    /// status, if any. Used by the deploy gate.
    async fn find_run_for_changeset(
        &self,
        tenant_id: Uuid,
        changeset_id: Uuid,
        run_type: RunType,
        status: RunStatus,
    ) -> Result<Option<Run>, SandboxError>;

    async fn insert_artifact(&self, artifact: Artifact) -> Result<(), SandboxError>;

    /// Artifacts for a run, oldest first.
    async fn list_artifacts(
        &self,
        tenant_id: Uuid,
        run_id: Uuid,
    ) -> Result<Vec<Artifact>, SandboxError>;
}

// memory.rs — The MemoryStore.
//
// One RwLock-guarded state struct implements all the store traits. No
// await happens while the lock is held, so the async trait methods are
// short critical sections. Apply locks live in a separate synchronous
// set because their guard releases in Drop.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use sp_audit::{AuditError, AuditEvent, AuditSink};
use sp_changeset::{
    ApplyGuard, Changeset, ChangesetError, ChangesetStore, Patch,
};
use sp_policy::{PolicyError, PolicyProfile, PolicyStore};
use sp_resolver::{
    similarity, EntityMapping, MappingStore, ResolverError, ScoredMapping,
};
use sp_sandbox::{Artifact, Run, RunStatus, RunType, SandboxError, RunStore};
use sp_workspace::{Workspace, WorkspaceError, WorkspaceFile, WorkspaceStatus, WorkspaceStore};

#[derive(Default)]
struct State {
    workspaces: HashMap<Uuid, Workspace>,
    /// Keyed by (workspace_id, path).
    files: HashMap<(Uuid, String), WorkspaceFile>,
    changesets: HashMap<Uuid, Changeset>,
    patches: Vec<Patch>,
    policies: Vec<PolicyProfile>,
    mappings: Vec<EntityMapping>,
    runs: HashMap<Uuid, Run>,
    artifacts: Vec<Artifact>,
    audits: Vec<AuditEvent>,
}

/// Capability token for cross-tenant reads. Only the service entry point
/// mints one, for the distinguished administrative role.
pub struct AdminCapability(pub(crate) ());

/// The in-memory repository.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    apply_locks: Arc<Mutex<HashSet<Uuid>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            apply_locks: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Mint the cross-tenant capability. Callers must gate this on the
    /// administrative role.
    pub fn grant_admin(&self) -> AdminCapability {
        AdminCapability(())
    }

    /// All audit events across tenants. Admin-only.
    pub async fn all_audit_events(&self, _admin: &AdminCapability) -> Vec<AuditEvent> {
        self.state.read().await.audits.clone()
    }

    /// One tenant's audit events, oldest first.
    pub async fn audit_events_for_tenant(&self, tenant_id: Uuid) -> Vec<AuditEvent> {
        self.state
            .read()
            .await
            .audits
            .iter()
            .filter(|event| event.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    /// All workspaces across tenants. Admin-only.
    pub async fn all_workspaces(&self, _admin: &AdminCapability) -> Vec<Workspace> {
        self.state.read().await.workspaces.values().cloned().collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── WorkspaceStore ───────────────────────────────────────────────

#[async_trait]
impl WorkspaceStore for MemoryStore {
    async fn create_workspace(&self, workspace: Workspace) -> Result<(), WorkspaceError> {
        self.state
            .write()
            .await
            .workspaces
            .insert(workspace.id, workspace);
        Ok(())
    }

    async fn get_workspace(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Option<Workspace>, WorkspaceError> {
        Ok(self
            .state
            .read()
            .await
            .workspaces
            .get(&workspace_id)
            .filter(|ws| ws.tenant_id == tenant_id)
            .cloned())
    }

    async fn most_recent_active_workspace(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<Workspace>, WorkspaceError> {
        Ok(self
            .state
            .read()
            .await
            .workspaces
            .values()
            .filter(|ws| ws.tenant_id == tenant_id && ws.status == WorkspaceStatus::Active)
            .max_by_key(|ws| ws.created_at)
            .cloned())
    }

    async fn list_files(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<WorkspaceFile>, WorkspaceError> {
        let state = self.state.read().await;
        let mut files: Vec<WorkspaceFile> = state
            .files
            .values()
            .filter(|f| {
                f.workspace_id == workspace_id && f.tenant_id == tenant_id && !f.is_directory
            })
            .cloned()
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn get_file(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
        path: &str,
    ) -> Result<Option<WorkspaceFile>, WorkspaceError> {
        Ok(self
            .state
            .read()
            .await
            .files
            .get(&(workspace_id, path.to_string()))
            .filter(|f| f.tenant_id == tenant_id)
            .cloned())
    }

    async fn put_file(&self, file: WorkspaceFile) -> Result<(), WorkspaceError> {
        self.state
            .write()
            .await
            .files
            .insert((file.workspace_id, file.path.clone()), file);
        Ok(())
    }

    async fn delete_file(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
        path: &str,
    ) -> Result<(), WorkspaceError> {
        let mut state = self.state.write().await;
        let key = (workspace_id, path.to_string());
        if let Some(file) = state.files.get(&key) {
            if file.tenant_id == tenant_id {
                state.files.remove(&key);
            }
        }
        Ok(())
    }
}

// ── ChangesetStore ───────────────────────────────────────────────

struct MemoryApplyGuard {
    locks: Arc<Mutex<HashSet<Uuid>>>,
    changeset_id: Uuid,
}

impl Drop for MemoryApplyGuard {
    fn drop(&mut self) {
        if let Ok(mut locks) = self.locks.lock() {
            locks.remove(&self.changeset_id);
        }
    }
}

impl ApplyGuard for MemoryApplyGuard {}

#[async_trait]
impl ChangesetStore for MemoryStore {
    async fn insert_changeset(&self, changeset: Changeset) -> Result<(), ChangesetError> {
        self.state
            .write()
            .await
            .changesets
            .insert(changeset.id, changeset);
        Ok(())
    }

    async fn get_changeset(
        &self,
        tenant_id: Uuid,
        changeset_id: Uuid,
    ) -> Result<Option<Changeset>, ChangesetError> {
        Ok(self
            .state
            .read()
            .await
            .changesets
            .get(&changeset_id)
            .filter(|cs| cs.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_changeset(&self, changeset: Changeset) -> Result<(), ChangesetError> {
        let mut state = self.state.write().await;
        match state.changesets.get(&changeset.id) {
            Some(existing) if existing.tenant_id == changeset.tenant_id => {
                state.changesets.insert(changeset.id, changeset);
                Ok(())
            }
            _ => Err(ChangesetError::NotFound),
        }
    }

    async fn list_changesets(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<Changeset>, ChangesetError> {
        let state = self.state.read().await;
        let mut changesets: Vec<Changeset> = state
            .changesets
            .values()
            .filter(|cs| cs.tenant_id == tenant_id && cs.workspace_id == workspace_id)
            .cloned()
            .collect();
        changesets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(changesets)
    }

    async fn insert_patch(&self, patch: Patch) -> Result<(), ChangesetError> {
        self.state.write().await.patches.push(patch);
        Ok(())
    }

    async fn list_patches(
        &self,
        tenant_id: Uuid,
        changeset_id: Uuid,
    ) -> Result<Vec<Patch>, ChangesetError> {
        let state = self.state.read().await;
        let mut patches: Vec<Patch> = state
            .patches
            .iter()
            .filter(|p| p.tenant_id == tenant_id && p.changeset_id == changeset_id)
            .cloned()
            .collect();
        patches.sort_by_key(|p| p.apply_order);
        Ok(patches)
    }

    async fn lock_for_apply(
        &self,
        tenant_id: Uuid,
        changeset_id: Uuid,
    ) -> Result<Box<dyn ApplyGuard>, ChangesetError> {
        // Verify tenant ownership before taking the lock.
        if self.get_changeset(tenant_id, changeset_id).await?.is_none() {
            return Err(ChangesetError::NotFound);
        }

        let mut locks = self
            .apply_locks
            .lock()
            .map_err(|_| ChangesetError::StoreFailed("apply lock poisoned".to_string()))?;
        if !locks.insert(changeset_id) {
            return Err(ChangesetError::ApplyLockBusy);
        }
        Ok(Box::new(MemoryApplyGuard {
            locks: Arc::clone(&self.apply_locks),
            changeset_id,
        }))
    }
}

// ── PolicyStore ──────────────────────────────────────────────────

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn get_active(&self, tenant_id: Uuid) -> Result<Option<PolicyProfile>, PolicyError> {
        Ok(self
            .state
            .read()
            .await
            .policies
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.is_active)
            .cloned())
    }

    async fn save(&self, profile: PolicyProfile) -> Result<(), PolicyError> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.policies.iter().find(|p| p.id == profile.id) {
            if existing.locked {
                return Err(PolicyError::ProfileLocked(existing.name.clone()));
            }
        }

        if profile.is_active {
            for other in state
                .policies
                .iter_mut()
                .filter(|p| p.tenant_id == profile.tenant_id && p.id != profile.id)
            {
                other.is_active = false;
            }
        }

        state.policies.retain(|p| p.id != profile.id);
        state.policies.push(profile);
        Ok(())
    }

    async fn set_locked(
        &self,
        tenant_id: Uuid,
        profile_id: Uuid,
        locked: bool,
    ) -> Result<(), PolicyError> {
        let mut state = self.state.write().await;
        let profile = state
            .policies
            .iter_mut()
            .find(|p| p.tenant_id == tenant_id && p.id == profile_id)
            .ok_or(PolicyError::NotFound)?;
        profile.locked = locked;
        Ok(())
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<PolicyProfile>, PolicyError> {
        let state = self.state.read().await;
        let mut profiles: Vec<PolicyProfile> = state
            .policies
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(profiles)
    }
}

// ── MappingStore ─────────────────────────────────────────────────

#[async_trait]
impl MappingStore for MemoryStore {
    async fn upsert_mapping(&self, mapping: EntityMapping) -> Result<(), ResolverError> {
        let mut state = self.state.write().await;
        state.mappings.retain(|m| {
            !(m.tenant_id == mapping.tenant_id
                && m.entity_type == mapping.entity_type
                && m.script_id == mapping.script_id)
        });
        state.mappings.push(mapping);
        Ok(())
    }

    async fn search_similar(
        &self,
        tenant_id: Uuid,
        phrase: &str,
        k: usize,
    ) -> Result<Vec<ScoredMapping>, ResolverError> {
        let state = self.state.read().await;
        let mut scored: Vec<ScoredMapping> = state
            .mappings
            .iter()
            .filter(|m| m.tenant_id == tenant_id)
            .map(|m| ScoredMapping {
                score: similarity(phrase, &m.natural_name),
                mapping: m.clone(),
            })
            .filter(|s| s.score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

// ── RunStore ─────────────────────────────────────────────────────

#[async_trait]
impl RunStore for MemoryStore {
    async fn insert_run(&self, run: Run) -> Result<(), SandboxError> {
        self.state.write().await.runs.insert(run.id, run);
        Ok(())
    }

    async fn get_run(&self, tenant_id: Uuid, run_id: Uuid) -> Result<Option<Run>, SandboxError> {
        Ok(self
            .state
            .read()
            .await
            .runs
            .get(&run_id)
            .filter(|run| run.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_run(&self, run: Run) -> Result<(), SandboxError> {
        let mut state = self.state.write().await;
        match state.runs.get(&run.id) {
            Some(existing) if existing.tenant_id == run.tenant_id => {
                // Terminal runs are immutable.
                if existing.status.is_terminal() {
                    return Err(SandboxError::StoreFailed(format!(
                        "run {} is terminal ({})",
                        run.id, existing.status
                    )));
                }
                state.runs.insert(run.id, run);
                Ok(())
            }
            _ => Err(SandboxError::RunNotFound),
        }
    }

    async fn find_run_for_changeset(
        &self,
        tenant_id: Uuid,
        changeset_id: Uuid,
        run_type: RunType,
        status: RunStatus,
    ) -> Result<Option<Run>, SandboxError> {
        Ok(self
            .state
            .read()
            .await
            .runs
            .values()
            .filter(|run| {
                run.tenant_id == tenant_id
                    && run.changeset_id == Some(changeset_id)
                    && run.run_type == run_type
                    && run.status == status
            })
            .max_by_key(|run| run.created_at)
            .cloned())
    }

    async fn insert_artifact(&self, artifact: Artifact) -> Result<(), SandboxError> {
        self.state.write().await.artifacts.push(artifact);
        Ok(())
    }

    async fn list_artifacts(
        &self,
        tenant_id: Uuid,
        run_id: Uuid,
    ) -> Result<Vec<Artifact>, SandboxError> {
        Ok(self
            .state
            .read()
            .await
            .artifacts
            .iter()
            .filter(|a| a.tenant_id == tenant_id && a.run_id == run_id)
            .cloned()
            .collect())
    }
}

// ── AuditSink ────────────────────────────────────────────────────

#[async_trait]
impl AuditSink for MemoryStore {
    async fn append(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.state.write().await.audits.push(event);
        Ok(())
    }
}

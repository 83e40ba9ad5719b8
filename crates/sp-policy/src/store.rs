// store.rs — The PolicyStore capability.
//
// Profiles persist through this trait; the backing store is supplied by
// the surrounding service. Saving a new active profile deactivates the
// previous one, keeping the "at most one active per tenant" invariant in
// one place.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PolicyError;
use crate::profile::PolicyProfile;

/// Persistence for policy profiles.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// The tenant's single active profile, if any.
    async fn get_active(&self, tenant_id: Uuid) -> Result<Option<PolicyProfile>, PolicyError>;

    /// Insert or replace a profile. When the profile is active, any other
    /// active profile for the tenant is deactivated. Fails with
    /// [`PolicyError::ProfileLocked`] if an existing locked profile with
    /// the same ID would be overwritten.
    async fn save(&self, profile: PolicyProfile) -> Result<(), PolicyError>;

    /// Lock or unlock a profile. Locking is an administrative action.
    async fn set_locked(
        &self,
        tenant_id: Uuid,
        profile_id: Uuid,
        locked: bool,
    ) -> Result<(), PolicyError>;

    /// All profiles for a tenant, newest version first.
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<PolicyProfile>, PolicyError>;
}

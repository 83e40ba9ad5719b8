// changeset.rs — The Changeset entity.
//
// A changeset records who proposed, reviewed, and applied it, with a
// timestamp for each transition. Once applied it is immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::ChangesetState;

/// A reviewed bundle of file modifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Changeset {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub workspace_id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ChangesetState,

    pub proposed_by: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Changeset {
    /// Create a draft changeset.
    pub fn new(
        tenant_id: Uuid,
        workspace_id: Uuid,
        title: impl Into<String>,
        proposed_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            workspace_id,
            title: title.into(),
            description: None,
            status: ChangesetState::Draft,
            proposed_by,
            reviewed_by: None,
            applied_by: None,
            created_at: Utc::now(),
            submitted_at: None,
            reviewed_at: None,
            applied_at: None,
            rejection_reason: None,
        }
    }

    /// Set the description and return self (builder pattern).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

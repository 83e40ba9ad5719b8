// mapping.rs — EntityMapping and its store.
//
// Mappings are upserted from discovered metadata, keyed by
// `(tenant, entity_type, script_id)` so rediscovery refreshes names
// without duplicating rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ResolverError;

/// A tenant's record linking a natural name to a stable script ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMapping {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// What kind of entity this is (e.g. "custom_field", "record_type").
    pub entity_type: String,
    /// The stable system identifier (e.g. "custbody_channel").
    pub script_id: String,
    /// The name users actually say (e.g. "Sales Channel").
    pub natural_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl EntityMapping {
    pub fn new(
        tenant_id: Uuid,
        entity_type: impl Into<String>,
        script_id: impl Into<String>,
        natural_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            entity_type: entity_type.into(),
            script_id: script_id.into(),
            natural_name: natural_name.into(),
            description: None,
            updated_at: Utc::now(),
        }
    }
}

/// A mapping with its similarity score for one query phrase.
#[derive(Debug, Clone)]
pub struct ScoredMapping {
    pub mapping: EntityMapping,
    pub score: f64,
}

/// Persistence and similarity search for entity mappings.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Insert or refresh a mapping keyed by
    /// `(tenant, entity_type, script_id)`.
    async fn upsert_mapping(&self, mapping: EntityMapping) -> Result<(), ResolverError>;

    /// The top `k` mappings for a phrase by trigram similarity,
    /// best first, excluding zero scores.
    async fn search_similar(
        &self,
        tenant_id: Uuid,
        phrase: &str,
        k: usize,
    ) -> Result<Vec<ScoredMapping>, ResolverError>;
}

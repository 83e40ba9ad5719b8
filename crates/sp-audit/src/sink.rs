// sink.rs — The AuditSink capability.
//
// Persistence is abstract: the core appends events through this trait and
// the surrounding service supplies the backing store. The trait has no
// update or delete operation; audit rows are append-only.

use async_trait::async_trait;

use crate::error::AuditError;
use crate::event::AuditEvent;

/// Append-only destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one event. Implementations must not reorder events from a
    /// single caller.
    async fn append(&self, event: AuditEvent) -> Result<(), AuditError>;
}

// executor.rs — The QueryExecutor capability.
//
// Assertion queries run through this trait; the real implementation lives
// with the NetSuite connector outside the core. An execution failure is
// returned as a plain string and becomes an `error` assertion outcome
// rather than aborting the batch.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Result rows from one query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: u64,
}

impl QueryResult {
    /// The first column of the first row, for scalar assertions.
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// Executes a read-only query with a row cap and a timeout.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(
        &self,
        query: &str,
        limit: u32,
        timeout: Duration,
    ) -> Result<QueryResult, String>;
}

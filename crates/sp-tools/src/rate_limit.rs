// rate_limit.rs — Sliding-window rate limiting per (tenant, tool).
//
// One process-wide map of timestamp windows, explicitly constructed and
// passed by reference rather than living in a global. Expired timestamps
// are compacted lazily on every check. Limits are enforced per process;
// a distributed variant would replace this type behind the same call
// sites.

use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use uuid::Uuid;

/// Window length for every tool's per-minute limit.
const WINDOW_MILLIS: u64 = 60_000;

/// Monotonic-enough time source, injectable for tests.
pub trait RateClock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock implementation used in production.
pub struct SystemClock;

impl RateClock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Process-wide sliding windows keyed by `(tenant, tool)`.
///
/// DashMap shards the lock per key region, so two tenants (or two tools)
/// never contend on the same entry.
pub struct RateLimiter {
    windows: DashMap<(Uuid, String), Vec<u64>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Record a call attempt. Returns `false` (and records nothing) when
    /// the window already holds `limit_per_minute` timestamps.
    pub fn check_and_record(
        &self,
        clock: &dyn RateClock,
        tenant_id: Uuid,
        tool_name: &str,
        limit_per_minute: u32,
    ) -> bool {
        let now = clock.now_millis();
        let window_start = now.saturating_sub(WINDOW_MILLIS);

        let mut entry = self
            .windows
            .entry((tenant_id, tool_name.to_string()))
            .or_default();

        entry.retain(|ts| *ts > window_start);

        if entry.len() >= limit_per_minute as usize {
            return false;
        }
        entry.push(now);
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

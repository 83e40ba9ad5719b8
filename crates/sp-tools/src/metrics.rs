// metrics.rs — In-process counters for governed tool calls.
//
// Counts calls by (tool, outcome) plus a dedicated rate-limit rejection
// counter. Explicitly constructed and shared by reference, like the rate
// limiter; an exporter can walk the snapshots.

use dashmap::DashMap;

/// Call counters for the governance engine.
pub struct ToolMetrics {
    calls: DashMap<(String, String), u64>,
    rate_limit_rejections: DashMap<String, u64>,
}

impl ToolMetrics {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
            rate_limit_rejections: DashMap::new(),
        }
    }

    pub fn record_call(&self, tool: &str, outcome: &str) {
        *self
            .calls
            .entry((tool.to_string(), outcome.to_string()))
            .or_insert(0) += 1;
    }

    pub fn record_rate_limit_rejection(&self, tool: &str) {
        *self.rate_limit_rejections.entry(tool.to_string()).or_insert(0) += 1;
    }

    pub fn call_count(&self, tool: &str, outcome: &str) -> u64 {
        self.calls
            .get(&(tool.to_string(), outcome.to_string()))
            .map(|v| *v)
            .unwrap_or(0)
    }

    pub fn rate_limit_rejection_count(&self, tool: &str) -> u64 {
        self.rate_limit_rejections
            .get(tool)
            .map(|v| *v)
            .unwrap_or(0)
    }
}

impl Default for ToolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = ToolMetrics::new();
        metrics.record_call("health", "success");
        metrics.record_call("health", "success");
        metrics.record_call("health", "denied");
        metrics.record_rate_limit_rejection("health");

        assert_eq!(metrics.call_count("health", "success"), 2);
        assert_eq!(metrics.call_count("health", "denied"), 1);
        assert_eq!(metrics.rate_limit_rejection_count("health"), 1);
        assert_eq!(metrics.call_count("other", "success"), 0);
    }
}

//! Engine metrics recording.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Registers metric descriptions with the installed recorder.
/// Call once at startup; recording works without it.
pub fn register_metrics() {
    metrics::describe_counter!("settings_cache_hits_total", "Reads served from a fresh cache entry");
    metrics::describe_counter!("settings_cache_misses_total", "Reads that needed a revalidation");
    metrics::describe_counter!(
        "settings_revalidations_total",
        "Conditional fetches by outcome (modified, not_modified, error)"
    );
    metrics::describe_counter!(
        "settings_revalidations_coalesced_total",
        "Revalidation callers that joined an inflight request"
    );
    metrics::describe_counter!(
        "settings_stale_discards_total",
        "Revalidation results dropped because a newer write had landed"
    );
    metrics::describe_counter!(
        "settings_mutations_total",
        "Patch batches by outcome (committed, rolled_back)"
    );
    metrics::describe_histogram!(
        "settings_request_seconds",
        "Time spent on settings server requests"
    );
}

/// Metrics recorder shared by the store, the revalidation client and the
/// mutation engine. Atomic counters mirror the exported ones so tests and
/// debug logging can read them back.
#[derive(Debug, Clone, Default)]
pub struct SyncMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    coalesced: Arc<AtomicU64>,
    stale_discards: Arc<AtomicU64>,
    commits: Arc<AtomicU64>,
    rollbacks: Arc<AtomicU64>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("settings_cache_hits_total").increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("settings_cache_misses_total").increment(1);
    }

    pub fn record_revalidation(&self, outcome: &'static str) {
        counter!("settings_revalidations_total", "outcome" => outcome).increment(1);
    }

    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
        counter!("settings_revalidations_coalesced_total").increment(1);
    }

    pub fn record_stale_discard(&self) {
        self.stale_discards.fetch_add(1, Ordering::Relaxed);
        counter!("settings_stale_discards_total").increment(1);
    }

    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
        counter!("settings_mutations_total", "outcome" => "committed").increment(1);
    }

    pub fn record_rollback(&self) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
        counter!("settings_mutations_total", "outcome" => "rolled_back").increment(1);
    }

    /// Records the duration of a server request
    pub fn record_request_duration(&self, operation: &'static str, duration: Duration) {
        histogram!("settings_request_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }

    /// Hit rate over fresh-window reads (for logging/debugging)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    pub fn stale_discards(&self) -> u64 {
        self.stale_discards.load(Ordering::Relaxed)
    }

    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    pub fn rollbacks(&self) -> u64 {
        self.rollbacks.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let metrics = SyncMetrics::new();
        assert_eq!(metrics.hit_rate(), 0.0);

        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();

        assert!((metrics.hit_rate() - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = SyncMetrics::new();
        let clone = metrics.clone();

        clone.record_commit();
        clone.record_rollback();
        clone.record_rollback();
        clone.record_stale_discard();

        assert_eq!(metrics.commits(), 1);
        assert_eq!(metrics.rollbacks(), 2);
        assert_eq!(metrics.stale_discards(), 1);
    }
}

use std::collections::HashMap;

use crate::models::{ReachabilityRecord, ReachabilityState, REACHABILITY_TTL_MS};

/// Latest reachability record per host name.
///
/// Writes replace the previous record wholesale. A write carrying an older
/// batch sequence than the stored record is rejected, so overlapping probe
/// batches cannot roll a host back to an earlier result.
#[derive(Debug, Clone)]
pub struct ReachabilityCache {
    records: HashMap<String, ReachabilityRecord>,
    ttl_ms: i64,
}

impl ReachabilityCache {
    pub fn new() -> Self {
        Self::with_ttl(REACHABILITY_TTL_MS)
    }

    pub fn with_ttl(ttl_ms: i64) -> Self {
        Self {
            records: HashMap::new(),
            ttl_ms,
        }
    }

    pub fn get(&self, host_name: &str) -> Option<&ReachabilityRecord> {
        self.records.get(host_name)
    }

    pub fn state(&self, host_name: &str) -> ReachabilityState {
        self.get(host_name)
            .map(|r| r.state)
            .unwrap_or(ReachabilityState::NotChecked)
    }

    pub fn is_fresh(&self, record: &ReachabilityRecord, now_ms: i64) -> bool {
        record.is_fresh_within(now_ms, self.ttl_ms)
    }

    /// Missing or stale records are refresh candidates.
    pub fn needs_refresh(&self, host_name: &str, now_ms: i64) -> bool {
        match self.get(host_name) {
            Some(record) => !self.is_fresh(record, now_ms),
            None => true,
        }
    }

    /// Stores `record` unless a newer batch already wrote this host.
    /// Returns whether the record was accepted.
    pub fn insert(&mut self, record: ReachabilityRecord) -> bool {
        if let Some(existing) = self.records.get(&record.host_name) {
            if record.batch < existing.batch {
                tracing::debug!(
                    "dropping out-of-order result for {} (batch {} < {})",
                    record.host_name,
                    record.batch,
                    existing.batch
                );
                return false;
            }
        }
        self.records.insert(record.host_name.clone(), record);
        true
    }

    pub fn apply(&mut self, records: Vec<ReachabilityRecord>) -> usize {
        records
            .into_iter()
            .map(|r| self.insert(r))
            .filter(|accepted| *accepted)
            .count()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[allow(dead_code)]
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for ReachabilityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, state: ReachabilityState, at: i64, batch: u64) -> ReachabilityRecord {
        ReachabilityRecord::new(name, state, at).with_batch(batch)
    }

    #[test]
    fn missing_record_is_not_checked_and_needs_refresh() {
        let cache = ReachabilityCache::new();
        assert_eq!(cache.state("devbox"), ReachabilityState::NotChecked);
        assert!(cache.needs_refresh("devbox", 0));
    }

    #[test]
    fn fresh_record_does_not_need_refresh() {
        let mut cache = ReachabilityCache::new();
        cache.insert(record("devbox", ReachabilityState::Available, 1_000, 1));

        assert!(!cache.needs_refresh("devbox", 1_000 + 299_999));
        assert!(
            cache.needs_refresh("devbox", 1_000 + 300_001),
            "needs_refresh: stale record should be a refresh candidate"
        );
    }

    #[test]
    fn stale_record_keeps_its_state() {
        let mut cache = ReachabilityCache::new();
        cache.insert(record("devbox", ReachabilityState::Available, 0, 1));

        assert!(cache.needs_refresh("devbox", 10 * REACHABILITY_TTL_MS));
        assert_eq!(
            cache.state("devbox"),
            ReachabilityState::Available,
            "state: TTL expiry must not change the recorded state"
        );
    }

    #[test]
    fn newer_batch_replaces_record_wholesale() {
        let mut cache = ReachabilityCache::new();
        cache.insert(record("devbox", ReachabilityState::Available, 100, 1));
        assert!(cache.insert(record("devbox", ReachabilityState::Unreachable, 200, 2)));

        let stored = cache.get("devbox").unwrap();
        assert_eq!(stored.state, ReachabilityState::Unreachable);
        assert_eq!(stored.checked_at, 200);
    }

    #[test]
    fn same_batch_result_replaces_checking_marker() {
        let mut cache = ReachabilityCache::new();
        cache.insert(record("devbox", ReachabilityState::Checking, 100, 3));
        assert!(cache.insert(record("devbox", ReachabilityState::Available, 150, 3)));
        assert_eq!(cache.state("devbox"), ReachabilityState::Available);
    }

    #[test]
    fn older_batch_write_is_rejected() {
        let mut cache = ReachabilityCache::new();
        cache.insert(record("devbox", ReachabilityState::Unavailable, 500, 5));

        assert!(
            !cache.insert(record("devbox", ReachabilityState::Available, 600, 4)),
            "insert: older batch should not overwrite a newer one"
        );
        assert_eq!(cache.state("devbox"), ReachabilityState::Unavailable);
    }

    #[test]
    fn apply_counts_accepted_records() {
        let mut cache = ReachabilityCache::new();
        cache.insert(record("b", ReachabilityState::Available, 0, 9));

        let accepted = cache.apply(vec![
            record("a", ReachabilityState::Available, 0, 2),
            record("b", ReachabilityState::Unreachable, 0, 2),
        ]);

        assert_eq!(accepted, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn custom_ttl_is_respected() {
        let mut cache = ReachabilityCache::with_ttl(1_000);
        cache.insert(record("devbox", ReachabilityState::Available, 0, 1));
        assert!(!cache.needs_refresh("devbox", 999));
        assert!(cache.needs_refresh("devbox", 1_000));
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = ReachabilityCache::new();
        cache.insert(record("devbox", ReachabilityState::Available, 0, 1));
        cache.clear();
        assert!(cache.is_empty());
    }
}

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::cache::ReachabilityCache;
use super::prober::ReachabilityProber;
use super::ssh::{RemoteRunner, SshRunner};
use crate::config::Config;
use crate::models::{HostDescriptor, ReachabilityRecord, ReachabilityState};
use crate::utils::now_millis;

struct ProbeBatch {
    seq: u64,
    host_names: Vec<String>,
    handle: JoinHandle<Vec<ReachabilityRecord>>,
}

/// Decides when to re-probe the configured hosts and publishes the ones
/// whose managed session is currently running.
///
/// Batches run as detached tasks; [`PollingCoordinator::poll`] folds the
/// finished ones into the cache from the owning loop. Overlapping batches
/// are never cancelled; the cache keeps whichever was issued last.
pub struct PollingCoordinator<R: RemoteRunner + 'static = SshRunner> {
    prober: Arc<ReachabilityProber<R>>,
    cache: ReachabilityCache,
    hosts: Vec<HostDescriptor>,
    in_flight: Vec<ProbeBatch>,
    next_batch: u64,
    environments: Vec<HostDescriptor>,
}

impl PollingCoordinator {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ReachabilityProber::from_config(config),
            ReachabilityCache::with_ttl(config.polling.reachability_ttl_ms as i64),
            config.hosts.clone(),
        )
    }
}

impl<R: RemoteRunner + 'static> PollingCoordinator<R> {
    pub fn new(
        prober: ReachabilityProber<R>,
        cache: ReachabilityCache,
        hosts: Vec<HostDescriptor>,
    ) -> Self {
        Self {
            prober: Arc::new(prober),
            cache,
            hosts,
            in_flight: Vec::new(),
            next_batch: 0,
            environments: Vec::new(),
        }
    }

    pub fn hosts(&self) -> &[HostDescriptor] {
        &self.hosts
    }

    #[allow(dead_code)]
    pub fn cache(&self) -> &ReachabilityCache {
        &self.cache
    }

    pub fn state(&self, host_name: &str) -> ReachabilityState {
        self.cache.state(host_name)
    }

    /// Hosts whose latest record is `Available`, in configured order.
    pub fn environments(&self) -> &[HostDescriptor] {
        &self.environments
    }

    pub fn is_detecting(&self) -> bool {
        !self.in_flight.is_empty()
    }

    fn eligible_hosts(&self) -> impl Iterator<Item = &HostDescriptor> {
        self.hosts.iter().filter(|h| h.is_ssh_eligible())
    }

    fn eligible_signature(hosts: &[HostDescriptor]) -> BTreeSet<(String, String)> {
        hosts
            .iter()
            .filter_map(|h| h.ssh_target().map(|t| (h.name.clone(), t.identity())))
            .collect()
    }

    /// Replaces the configured host set, starting a batch if the eligible
    /// part of it changed. Returns whether a batch was started.
    pub fn set_hosts(&mut self, hosts: Vec<HostDescriptor>) -> bool {
        let changed = Self::eligible_signature(&self.hosts) != Self::eligible_signature(&hosts);
        self.hosts = hosts;
        self.republish();

        if changed {
            tracing::debug!("host set changed, re-probing");
            self.start_batch()
        } else {
            false
        }
    }

    pub fn needs_refresh_at(&self, now_ms: i64) -> bool {
        self.eligible_hosts()
            .any(|h| self.cache.needs_refresh(&h.name, now_ms))
    }

    /// Starts a batch over all eligible hosts if any of them has a missing
    /// or stale record. Returns whether a batch was started.
    pub fn refresh(&mut self) -> bool {
        if self.needs_refresh_at(now_millis()) {
            self.start_batch()
        } else {
            tracing::trace!("refresh: all records fresh");
            false
        }
    }

    /// Starts a batch regardless of freshness.
    pub fn force_refresh(&mut self) -> bool {
        self.start_batch()
    }

    fn start_batch(&mut self) -> bool {
        let hosts: Vec<HostDescriptor> = self.eligible_hosts().cloned().collect();
        if hosts.is_empty() {
            return false;
        }

        self.next_batch += 1;
        let seq = self.next_batch;
        let now = now_millis();
        for host in &hosts {
            self.cache.insert(
                ReachabilityRecord::new(host.name.clone(), ReachabilityState::Checking, now)
                    .with_batch(seq),
            );
        }

        let host_names = hosts.iter().map(|h| h.name.clone()).collect();
        let prober = Arc::clone(&self.prober);
        let handle = tokio::spawn(async move { prober.probe(&hosts).await });

        tracing::debug!("probe batch {} started", seq);
        self.in_flight.push(ProbeBatch {
            seq,
            host_names,
            handle,
        });
        self.republish();
        true
    }

    /// Applies every batch that has finished. Returns how many were applied.
    pub async fn poll(&mut self) -> usize {
        let batches = std::mem::take(&mut self.in_flight);
        let mut applied = 0;

        for batch in batches {
            if batch.handle.is_finished() {
                self.finish(batch).await;
                applied += 1;
            } else {
                self.in_flight.push(batch);
            }
        }

        if applied > 0 {
            self.republish();
        }
        applied
    }

    /// Waits for every in-flight batch and applies it.
    pub async fn wait(&mut self) {
        let batches = std::mem::take(&mut self.in_flight);
        for batch in batches {
            self.finish(batch).await;
        }
        self.republish();
    }

    async fn finish(&mut self, batch: ProbeBatch) {
        let seq = batch.seq;
        let records = match batch.handle.await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("probe batch {} aborted: {}", seq, e);
                let now = now_millis();
                batch
                    .host_names
                    .into_iter()
                    .map(|name| ReachabilityRecord::new(name, ReachabilityState::Unreachable, now))
                    .collect()
            }
        };

        let total = records.len();
        let accepted = self
            .cache
            .apply(records.into_iter().map(|r| r.with_batch(seq)).collect());
        tracing::debug!("probe batch {} applied {}/{} records", seq, accepted, total);
    }

    fn republish(&mut self) {
        self.environments = self
            .eligible_hosts()
            .filter(|h| self.cache.state(&h.name) == ReachabilityState::Available)
            .cloned()
            .collect();
    }
}

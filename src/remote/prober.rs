use std::sync::Arc;
use std::time::Duration;

use super::ssh::{RemoteError, RemoteOutput, RemoteRunner, SshRunner};
use crate::config::Config;
use crate::models::{HostDescriptor, ReachabilityRecord, ReachabilityState, SshTarget};
use crate::utils::now_millis;

/// Checks whether the managed session is running on each eligible host.
pub struct ReachabilityProber<R: RemoteRunner = SshRunner> {
    runner: Arc<R>,
    session_name: String,
    timeout: Duration,
}

impl ReachabilityProber {
    pub fn from_config(config: &Config) -> Self {
        Self::with_runner(
            SshRunner::from_config(config),
            config.session_name.clone(),
            config.timeouts.probe(),
        )
    }
}

impl<R: RemoteRunner> ReachabilityProber<R> {
    pub fn with_runner(runner: R, session_name: String, timeout: Duration) -> Self {
        Self {
            runner: Arc::new(runner),
            session_name,
            timeout,
        }
    }

    pub fn marker_token(&self) -> String {
        format!("{}:running", self.session_name)
    }

    pub fn check_command(&self) -> String {
        format!(
            "tmux has-session -t {} 2>/dev/null && echo \"{}\"",
            self.session_name,
            self.marker_token()
        )
    }

    /// Probes every eligible host concurrently and waits for all of them.
    ///
    /// Ineligible hosts are skipped and produce no record. Never fails: any
    /// transport problem becomes `Unreachable`.
    pub async fn probe(&self, hosts: &[HostDescriptor]) -> Vec<ReachabilityRecord> {
        let mut seen = std::collections::HashSet::new();
        let targets: Vec<(String, SshTarget)> = hosts
            .iter()
            .filter_map(|host| host.ssh_target().map(|t| (host.name.clone(), t)))
            .filter(|(name, _)| seen.insert(name.clone()))
            .collect();

        if targets.is_empty() {
            return Vec::new();
        }

        let command = self.check_command();
        let probes: Vec<_> = targets
            .iter()
            .map(|(name, target)| {
                let command = &command;
                async move {
                    let result = self.runner.run(target, command, self.timeout).await;
                    let state = self.classify(name, result);
                    ReachabilityRecord::new(name.clone(), state, now_millis())
                }
            })
            .collect();

        let records = futures::future::join_all(probes).await;

        let available = records
            .iter()
            .filter(|r| r.state == ReachabilityState::Available)
            .count();
        tracing::info!(
            "reachability probe settled: {}/{} hosts available",
            available,
            records.len()
        );

        records
    }

    fn classify(
        &self,
        host_name: &str,
        result: Result<RemoteOutput, RemoteError>,
    ) -> ReachabilityState {
        match result {
            Ok(output) if output.stdout.contains(&self.marker_token()) => {
                tracing::debug!("probe {}: session marker found", host_name);
                ReachabilityState::Available
            }
            Ok(output) => {
                tracing::debug!(
                    "probe {}: no session marker (exit {})",
                    host_name,
                    output.status
                );
                ReachabilityState::Unavailable
            }
            Err(e) => {
                tracing::debug!("probe {}: unreachable: {}", host_name, e);
                ReachabilityState::Unreachable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::ssh::mock::{MockReply, MockRunner};
    use super::*;

    fn prober(runner: MockRunner) -> ReachabilityProber<MockRunner> {
        ReachabilityProber::with_runner(runner, "yeehaw".to_string(), Duration::from_secs(7))
    }

    fn host(name: &str) -> HostDescriptor {
        HostDescriptor::remote(name, &format!("{name}.internal"), "dev", 22, "/keys/id")
    }

    fn state_of(records: &[ReachabilityRecord], name: &str) -> Option<ReachabilityState> {
        records.iter().find(|r| r.host_name == name).map(|r| r.state)
    }

    #[test]
    fn check_command_matches_remote_contract() {
        let prober = prober(MockRunner::new());
        assert_eq!(
            prober.check_command(),
            "tmux has-session -t yeehaw 2>/dev/null && echo \"yeehaw:running\""
        );
    }

    #[tokio::test]
    async fn classifies_each_outcome() {
        let runner = MockRunner::new()
            .with_reply("up.internal", MockReply::Stdout("yeehaw:running\n".to_string()))
            .with_reply("idle.internal", MockReply::Exit(1))
            .with_reply("down.internal", MockReply::Refused)
            .with_reply("slow.internal", MockReply::TimedOut);
        let prober = prober(runner);

        let records = prober
            .probe(&[host("up"), host("idle"), host("down"), host("slow")])
            .await;

        assert_eq!(state_of(&records, "up"), Some(ReachabilityState::Available));
        assert_eq!(state_of(&records, "idle"), Some(ReachabilityState::Unavailable));
        assert_eq!(state_of(&records, "down"), Some(ReachabilityState::Unreachable));
        assert_eq!(state_of(&records, "slow"), Some(ReachabilityState::Unreachable));
    }

    #[tokio::test]
    async fn output_without_token_is_unavailable() {
        let runner = MockRunner::new()
            .with_reply("up.internal", MockReply::Stdout("some banner\n".to_string()));
        let records = prober(runner).probe(&[host("up")]).await;

        assert_eq!(
            state_of(&records, "up"),
            Some(ReachabilityState::Unavailable),
            "probe: completed command without the marker token should be unavailable"
        );
    }

    #[tokio::test]
    async fn one_record_per_eligible_host_only() {
        let runner = MockRunner::new()
            .with_reply("a.internal", MockReply::Stdout("yeehaw:running".to_string()));
        let mut incomplete = host("c");
        incomplete.identity_file = None;

        let records = prober(runner.clone())
            .probe(&[host("a"), host("b"), incomplete, HostDescriptor::local()])
            .await;

        let mut names: Vec<_> = records.iter().map(|r| r.host_name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            runner.call_count(),
            2,
            "probe: ineligible hosts must not be contacted"
        );
    }

    #[tokio::test]
    async fn duplicate_host_names_yield_one_record() {
        let records = prober(MockRunner::new()).probe(&[host("a"), host("a")]).await;
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn empty_host_set_issues_no_work() {
        let runner = MockRunner::new();
        let records = prober(runner.clone()).probe(&[]).await;

        assert!(records.is_empty());
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn probes_run_concurrently_behind_a_join_barrier() {
        let runner = MockRunner::new()
            .with_reply("fast.internal", MockReply::Stdout("yeehaw:running".to_string()))
            .with_delay("fast.internal", Duration::from_millis(10))
            .with_reply("slow.internal", MockReply::Exit(1))
            .with_delay("slow.internal", Duration::from_secs(6));
        let prober = prober(runner);

        let start = tokio::time::Instant::now();
        let records = prober.probe(&[host("fast"), host("slow")]).await;
        let elapsed = start.elapsed();

        assert_eq!(records.len(), 2, "probe: batch should wait for every probe");
        assert!(
            elapsed < Duration::from_millis(6_100),
            "probe: probes should overlap, took {:?}",
            elapsed
        );
        assert!(elapsed >= Duration::from_secs(6));
    }
}

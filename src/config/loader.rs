use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::HostDescriptor;
use crate::utils::expand_tilde;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// SSH `ConnectTimeout`, in seconds.
    pub connect: u64,
    /// Extra time a reachability probe gets on top of the connect timeout.
    pub probe_grace: u64,
    /// Overall bound on a remote directory listing, in seconds.
    pub listing: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: 5,
            probe_grace: 2,
            listing: 5,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.connect + self.probe_grace)
    }

    pub fn listing(&self) -> Duration {
        Duration::from_secs(self.listing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub reachability_ttl_ms: u64,
    pub reachability_poll_ms: u64,
    pub completion_debounce_ms: u64,
    pub signal_poll_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            reachability_ttl_ms: 300_000,
            reachability_poll_ms: 30_000,
            completion_debounce_ms: 200,
            signal_poll_ms: 2_000,
        }
    }
}

impl PollingConfig {
    pub fn reachability_poll(&self) -> Duration {
        Duration::from_millis(self.reachability_poll_ms)
    }

    pub fn completion_debounce(&self) -> Duration {
        Duration::from_millis(self.completion_debounce_ms)
    }

    pub fn signal_poll(&self) -> Duration {
        Duration::from_millis(self.signal_poll_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the multiplexer session that marks a managed environment.
    #[serde(default = "default_session_name")]
    pub session_name: String,
    #[serde(default = "default_signal_dir")]
    pub signal_dir: String,
    #[serde(default)]
    pub hosts: Vec<HostDescriptor>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

fn default_session_name() -> String {
    "yeehaw".to_string()
}

fn default_signal_dir() -> String {
    "~/.yeehaw/signals".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_name: default_session_name(),
            signal_dir: default_signal_dir(),
            hosts: vec![HostDescriptor::local()],
            timeouts: TimeoutConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = config_path.unwrap_or_else(Self::default_config_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            tracing::debug!("loaded {} hosts from {:?}", config.hosts.len(), path);
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn default_config_path() -> PathBuf {
        if let Some(config_path) = std::env::var_os("YEEHAW_CONFIG") {
            PathBuf::from(config_path)
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("yeehaw")
                .join("config.yaml")
        }
    }

    pub fn signal_dir(&self) -> PathBuf {
        expand_tilde(&self.signal_dir)
    }

    pub fn get_host(&self, name: &str) -> Option<&HostDescriptor> {
        self.hosts.iter().find(|h| h.name.eq_ignore_ascii_case(name))
    }

    pub fn eligible_hosts(&self) -> impl Iterator<Item = &HostDescriptor> {
        self.hosts.iter().filter(|h| h.is_ssh_eligible())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_default_has_local_host_only() {
        let config = Config::default();
        assert_eq!(config.session_name, "yeehaw");
        assert_eq!(config.hosts.len(), 1);
        assert!(config.hosts[0].is_local());
        assert_eq!(config.eligible_hosts().count(), 0);
    }

    #[test]
    fn default_timeouts_match_ssh_contract() {
        let timeouts = TimeoutConfig::default();
        assert_eq!(timeouts.connect(), Duration::from_secs(5));
        assert_eq!(
            timeouts.probe(),
            Duration::from_secs(7),
            "probe timeout should be connect timeout plus 2s"
        );
        assert_eq!(timeouts.listing(), Duration::from_secs(5));
    }

    #[test]
    fn config_loads_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml = r#"
session_name: "ranch"
signal_dir: "/tmp/ranch/signals"
hosts:
  - name: local
  - name: devbox
    host: 10.0.0.4
    user: dev
    port: 2222
    identity_file: /keys/devbox
  - name: half
    host: half.internal
    user: dev
timeouts:
  connect: 3
  probe_grace: 1
  listing: 4
polling:
  reachability_ttl_ms: 60000
  reachability_poll_ms: 10000
  completion_debounce_ms: 150
  signal_poll_ms: 1000
"#;
        std::fs::write(&config_path, yaml).unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.session_name, "ranch");
        assert_eq!(config.hosts.len(), 3);
        assert_eq!(config.timeouts.probe(), Duration::from_secs(4));
        assert_eq!(config.polling.completion_debounce(), Duration::from_millis(150));
        assert_eq!(config.signal_dir(), PathBuf::from("/tmp/ranch/signals"));

        let eligible: Vec<_> = config.eligible_hosts().map(|h| h.name.as_str()).collect();
        assert_eq!(eligible, vec!["devbox"]);
    }

    #[test]
    fn config_load_returns_default_when_file_missing() {
        let config = Config::load(Some(PathBuf::from("/nonexistent/config.yaml"))).unwrap();
        assert_eq!(config.session_name, "yeehaw");
        assert_eq!(config.polling.reachability_ttl_ms, 300_000);
    }

    #[test]
    fn config_load_fills_defaults_for_hosts_only_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let yaml = r#"
hosts:
  - name: devbox
    host: 10.0.0.4
    user: dev
    port: 22
    identity_file: /keys/devbox
"#;
        std::fs::write(&config_path, yaml).unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.session_name, "yeehaw");
        assert_eq!(config.signal_dir, "~/.yeehaw/signals");
        assert_eq!(config.timeouts.probe(), Duration::from_secs(7));
        assert_eq!(config.polling.reachability_ttl_ms, 300_000);
        assert_eq!(config.eligible_hosts().count(), 1);
    }

    #[test]
    fn config_load_fills_defaults_inside_partial_sections() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let yaml = r#"
timeouts:
  connect: 3
polling:
  signal_poll_ms: 500
"#;
        std::fs::write(&config_path, yaml).unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.timeouts.connect(), Duration::from_secs(3));
        assert_eq!(
            config.timeouts.probe(),
            Duration::from_secs(5),
            "load: probe_grace should default when only connect is set"
        );
        assert_eq!(config.timeouts.listing(), Duration::from_secs(5));
        assert_eq!(config.polling.signal_poll(), Duration::from_millis(500));
        assert_eq!(config.polling.reachability_ttl_ms, 300_000);
        assert_eq!(config.polling.completion_debounce(), Duration::from_millis(200));
    }

    #[test]
    fn config_load_fails_on_malformed_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "hosts: [unterminated").unwrap();

        assert!(Config::load(Some(config_path)).is_err());
    }

    #[test]
    fn get_host_is_case_insensitive() {
        let mut config = Config::default();
        config
            .hosts
            .push(HostDescriptor::remote("DevBox", "10.0.0.4", "dev", 22, "/k"));

        assert!(config.get_host("devbox").is_some());
        assert!(config.get_host("missing").is_none());
    }

    #[test]
    fn config_serializes_to_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();

        assert!(yaml.contains("session_name: yeehaw"));
        assert!(yaml.contains("name: local"));
    }
}

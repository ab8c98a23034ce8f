use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// How long a reachability result stays fresh (5 minutes).
pub const REACHABILITY_TTL_MS: i64 = 300_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReachabilityState {
    #[default]
    NotChecked,
    Checking,
    Available,
    Unavailable,
    Unreachable,
}

impl ReachabilityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReachabilityState::NotChecked => "not-checked",
            ReachabilityState::Checking => "checking",
            ReachabilityState::Available => "available",
            ReachabilityState::Unavailable => "unavailable",
            ReachabilityState::Unreachable => "unreachable",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ReachabilityState::NotChecked => "·",
            ReachabilityState::Checking => "◐",
            ReachabilityState::Available => "●",
            ReachabilityState::Unavailable => "○",
            ReachabilityState::Unreachable => "✗",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ReachabilityState::NotChecked => Color::DarkGray,
            ReachabilityState::Checking => Color::Yellow,
            ReachabilityState::Available => Color::Green,
            ReachabilityState::Unavailable => Color::Gray,
            ReachabilityState::Unreachable => Color::Red,
        }
    }

    /// Whether a probe has settled into a result.
    #[allow(dead_code)]
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ReachabilityState::Available
                | ReachabilityState::Unavailable
                | ReachabilityState::Unreachable
        )
    }
}

impl std::fmt::Display for ReachabilityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Latest known reachability of one host.
///
/// `batch` is the sequence number of the probe batch that produced the
/// record; the cache uses it to reject writes from older batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityRecord {
    pub host_name: String,
    pub state: ReachabilityState,
    pub checked_at: i64,
    pub batch: u64,
}

impl ReachabilityRecord {
    pub fn new(host_name: impl Into<String>, state: ReachabilityState, checked_at: i64) -> Self {
        Self {
            host_name: host_name.into(),
            state,
            checked_at,
            batch: 0,
        }
    }

    pub fn with_batch(mut self, batch: u64) -> Self {
        self.batch = batch;
        self
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.checked_at
    }

    #[allow(dead_code)]
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        self.is_fresh_within(now_ms, REACHABILITY_TTL_MS)
    }

    pub fn is_fresh_within(&self, now_ms: i64, ttl_ms: i64) -> bool {
        self.age_ms(now_ms) < ttl_ms
    }
}

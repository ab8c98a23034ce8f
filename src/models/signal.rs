use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A signal older than this is ignored on read (5 minutes).
pub const SIGNAL_STALE_MS: i64 = 300_000;

/// A signal older than this is deleted by a sweep (1 hour).
pub const SIGNAL_SWEEP_MS: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Working,
    Waiting,
    Idle,
    Error,
}

impl SignalStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            SignalStatus::Working => "⠋",
            SignalStatus::Waiting => "◆",
            SignalStatus::Idle => "○",
            SignalStatus::Error => "✗",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            SignalStatus::Working => Color::Green,
            SignalStatus::Waiting => Color::Yellow,
            SignalStatus::Idle => Color::Gray,
            SignalStatus::Error => Color::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Working => "working",
            SignalStatus::Waiting => "waiting",
            SignalStatus::Idle => "idle",
            SignalStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignalStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "working" => Ok(SignalStatus::Working),
            "waiting" => Ok(SignalStatus::Waiting),
            "idle" => Ok(SignalStatus::Idle),
            "error" => Ok(SignalStatus::Error),
            other => anyhow::bail!(
                "unknown signal status '{}' (expected working, waiting, idle or error)",
                other
            ),
        }
    }
}

/// Externally written activity state of one pane.
///
/// `updated` is whole seconds since the epoch, as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub status: SignalStatus,
    pub updated: i64,
}

impl SignalRecord {
    pub fn new(status: SignalStatus, updated: i64) -> Self {
        Self { status, updated }
    }

    pub fn updated_at_ms(&self) -> i64 {
        self.updated.saturating_mul(1000)
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.updated_at_ms()
    }

    pub fn is_stale(&self, now_ms: i64) -> bool {
        self.age_ms(now_ms) > SIGNAL_STALE_MS
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.age_ms(now_ms) > SIGNAL_SWEEP_MS
    }
}

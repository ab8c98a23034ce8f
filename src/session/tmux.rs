use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::Config;

const PANE_FORMAT: &str = "#{pane_id}\t#{window_index}.#{pane_index}\t#{pane_current_command}\t#{pane_title}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneInfo {
    pub pane_id: String,
    /// `window.pane` position inside the session.
    pub position: String,
    pub command: String,
    pub title: String,
}

impl PaneInfo {
    pub fn label(&self) -> String {
        if self.title.is_empty() || self.title == self.command {
            format!("{} {}", self.position, self.command)
        } else {
            format!("{} {} ({})", self.position, self.title, self.command)
        }
    }
}

pub fn parse_pane_list(stdout: &str) -> Vec<PaneInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(4, '\t');
            let pane_id = fields.next()?.trim();
            if pane_id.is_empty() {
                return None;
            }
            Some(PaneInfo {
                pane_id: pane_id.to_string(),
                position: fields.next().unwrap_or_default().to_string(),
                command: fields.next().unwrap_or_default().to_string(),
                title: fields.next().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Local multiplexer session that hosts the managed panes.
pub struct TmuxClient {
    session_name: String,
}

impl TmuxClient {
    pub fn new(session_name: String) -> Self {
        Self { session_name }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.session_name.clone())
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub async fn session_exists(&self) -> bool {
        Command::new("tmux")
            .args(["has-session", "-t", &self.session_name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn try_list_panes(&self) -> Result<Vec<PaneInfo>> {
        let output = Command::new("tmux")
            .args(["list-panes", "-s", "-t", &self.session_name, "-F", PANE_FORMAT])
            .stdin(Stdio::null())
            .output()
            .await
            .context("Failed to run tmux list-panes")?;

        if !output.status.success() {
            anyhow::bail!(
                "tmux list-panes failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(parse_pane_list(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Every pane across the session's windows; empty when tmux or the
    /// session is unavailable.
    pub async fn list_panes(&self) -> Vec<PaneInfo> {
        match self.try_list_panes().await {
            Ok(panes) => panes,
            Err(e) => {
                tracing::debug!("no panes for session {}: {:#}", self.session_name, e);
                Vec::new()
            }
        }
    }
}

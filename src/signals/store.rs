use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::Config;
use crate::models::{SignalRecord, SignalStatus, SIGNAL_SWEEP_MS};
use crate::utils::{now_millis, sanitize_key};

const SIGNAL_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".json.tmp";

/// Per-pane status files written by assistant hooks.
#[derive(Debug, Clone)]
pub struct SignalStore {
    dir: PathBuf,
}

impl SignalStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.signal_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, pane_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_key(pane_id), SIGNAL_EXTENSION))
    }

    pub async fn read(&self, pane_id: &str) -> Option<SignalRecord> {
        self.read_at(pane_id, now_millis()).await
    }

    /// Current signal for `pane_id`, or `None` when there is no usable,
    /// non-stale record.
    pub async fn read_at(&self, pane_id: &str, now_ms: i64) -> Option<SignalRecord> {
        if pane_id.is_empty() {
            return None;
        }

        let path = self.path_for(pane_id);
        let content = fs::read_to_string(&path).await.ok()?;
        let record: SignalRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("ignoring unparsable signal {:?}: {}", path, e);
                return None;
            }
        };

        if record.is_stale(now_ms) {
            return None;
        }
        Some(record)
    }

    /// Replaces the signal for `pane_id` with `status` stamped now.
    pub async fn write(&self, pane_id: &str, status: SignalStatus) -> Result<PathBuf> {
        let record = SignalRecord::new(status, now_millis() / 1000);
        self.write_record(pane_id, &record).await
    }

    pub async fn write_record(&self, pane_id: &str, record: &SignalRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create signal directory: {:?}", self.dir))?;

        let path = self.path_for(pane_id);
        let tmp_path = self
            .dir
            .join(format!("{}{}", sanitize_key(pane_id), TEMP_SUFFIX));
        let content = serde_json::to_string(record)?;

        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("Failed to write signal file: {:?}", tmp_path))?;
        fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to move signal file into place: {:?}", path))?;

        Ok(path)
    }

    pub async fn sweep(&self) -> Result<usize> {
        self.sweep_at(now_millis()).await
    }

    /// Deletes every record that is unparsable or older than an hour, plus
    /// temp files an interrupted writer left behind for as long.
    /// Returns how many files were removed.
    pub async fn sweep_at(&self, now_ms: i64) -> Result<usize> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read signal directory: {:?}", self.dir))
            }
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_temp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(TEMP_SUFFIX));
            if is_temp {
                if temp_is_abandoned(&entry, now_ms).await && remove_signal(&path).await {
                    removed += 1;
                }
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(SIGNAL_EXTENSION) {
                continue;
            }

            let expired = match fs::read_to_string(&path).await {
                Ok(content) => match serde_json::from_str::<SignalRecord>(&content) {
                    Ok(record) => record.is_expired(now_ms),
                    Err(_) => true,
                },
                Err(e) => {
                    tracing::debug!("skipping unreadable signal {:?}: {}", path, e);
                    false
                }
            };

            if expired && remove_signal(&path).await {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!("swept {} signal files from {:?}", removed, self.dir);
        }
        Ok(removed)
    }
}

async fn temp_is_abandoned(entry: &fs::DirEntry, now_ms: i64) -> bool {
    let modified = match entry.metadata().await.and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            tracing::debug!("skipping temp signal {:?}: {}", entry.path(), e);
            return false;
        }
    };
    let modified_ms = chrono::DateTime::<chrono::Utc>::from(modified).timestamp_millis();
    now_ms - modified_ms > SIGNAL_SWEEP_MS
}

async fn remove_signal(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("failed to remove signal {:?}: {}", path, e);
            false
        }
    }
}

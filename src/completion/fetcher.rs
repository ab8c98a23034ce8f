use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::cache::{CacheKey, CompletionCache};
use super::debounce::Debouncer;
use super::path::{filter_by_prefix, normalize_dir, PartialPath};
use crate::config::Config;
use crate::models::{HostDescriptor, SshTarget};
use crate::remote::{RemoteRunner, SshRunner};
use crate::utils::{expand_tilde, shell_single_quote};

/// Result of a debounced remote listing, delivered to the input owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionUpdate {
    /// The partial path the listing was requested for.
    pub input: String,
    pub host: String,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Ready(Vec<String>),
    /// A remote listing is scheduled; the candidates arrive as a
    /// [`CompletionUpdate`].
    Pending,
}

/// Remote command that prints the child directories of `dir`, one per line.
///
/// A leading `~` stays outside the quotes so the remote shell expands it.
pub fn listing_command(dir: &str) -> String {
    let arg = if dir == "~" {
        "~".to_string()
    } else if let Some(rest) = dir.strip_prefix("~/") {
        format!("~/{}", shell_single_quote(rest))
    } else {
        shell_single_quote(dir)
    };
    format!("ls -1F {} 2>/dev/null | grep '/$' | sed 's|/$||' || true", arg)
}

pub fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('/'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Child directories of a local directory, sorted by name.
///
/// A missing or unreadable directory yields an empty list. Hidden entries
/// are only offered once the segment itself starts with a dot.
pub fn list_local_dirs(dir: &Path, prefix: &str) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("cannot list {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let show_hidden = prefix.starts_with('.');
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(prefix))
        .filter(|name| show_hidden || !name.starts_with('.'))
        .collect();
    names.sort();
    names
}

/// Runs one listing. `None` means the listing failed and must not be cached.
async fn fetch_listing<R: RemoteRunner + ?Sized>(
    runner: &R,
    target: &SshTarget,
    dir: &str,
    timeout: Duration,
) -> Option<Vec<String>> {
    match runner.run(target, &listing_command(dir), timeout).await {
        Ok(output) if output.success() => Some(parse_listing(&output.stdout)),
        Ok(output) => {
            tracing::warn!(
                "listing {} on {} exited with {}",
                dir,
                target.destination(),
                output.status
            );
            None
        }
        Err(e) => {
            tracing::warn!("listing {} on {} failed: {}", dir, target.destination(), e);
            None
        }
    }
}

pub struct CompletionFetcher<R: RemoteRunner + 'static = SshRunner> {
    runner: Arc<R>,
    cache: CompletionCache,
    debouncer: Debouncer,
    listing_timeout: Duration,
    updates: mpsc::UnboundedSender<CompletionUpdate>,
}

impl CompletionFetcher<SshRunner> {
    pub fn from_config(
        config: &Config,
        cache: CompletionCache,
    ) -> (Self, mpsc::UnboundedReceiver<CompletionUpdate>) {
        Self::new(
            Arc::new(SshRunner::from_config(config)),
            cache,
            config.polling.completion_debounce(),
            config.timeouts.listing(),
        )
    }
}

impl<R: RemoteRunner + 'static> CompletionFetcher<R> {
    pub fn new(
        runner: Arc<R>,
        cache: CompletionCache,
        debounce: Duration,
        listing_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<CompletionUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let fetcher = Self {
            runner,
            cache,
            debouncer: Debouncer::new(debounce),
            listing_timeout,
            updates,
        };
        (fetcher, rx)
    }

    pub fn cache(&self) -> &CompletionCache {
        &self.cache
    }

    fn cache_key(target: &SshTarget, dir: &str) -> CacheKey {
        CompletionCache::key(&target.identity(), dir)
    }

    /// Candidates for `partial` on `host` (`None` or the local pseudo-host
    /// completes against the local filesystem).
    ///
    /// Remote cache misses schedule a debounced listing and return
    /// [`Completion::Pending`]; each call replaces the previously scheduled
    /// listing if it has not fired yet.
    pub fn complete(&mut self, partial: &str, host: Option<&HostDescriptor>) -> Completion {
        let path = PartialPath::parse(partial);

        let host = match host {
            Some(host) if !host.is_local() => host,
            _ => {
                self.debouncer.cancel();
                let dir = expand_tilde(&path.directory());
                return Completion::Ready(list_local_dirs(&dir, path.segment));
            }
        };

        let target = match host.ssh_target() {
            Some(target) => target,
            None => {
                self.debouncer.cancel();
                return Completion::Ready(Vec::new());
            }
        };

        let dir = path.directory();
        let key = Self::cache_key(&target, &dir);
        if let Some(children) = self.cache.get(&key) {
            self.debouncer.cancel();
            return Completion::Ready(filter_by_prefix(&children, path.segment));
        }

        let runner = Arc::clone(&self.runner);
        let cache = self.cache.clone();
        let updates = self.updates.clone();
        let timeout = self.listing_timeout;
        let input = partial.to_string();
        let segment = path.segment.to_string();
        let host_name = host.name.clone();

        self.debouncer.schedule(async move {
            let candidates = match fetch_listing(runner.as_ref(), &target, &dir, timeout).await {
                Some(children) => {
                    let candidates = filter_by_prefix(&children, &segment);
                    cache.insert(key, children);
                    candidates
                }
                None => Vec::new(),
            };
            tracing::debug!("{} candidates for {} on {}", candidates.len(), input, host_name);
            let _ = updates.send(CompletionUpdate {
                input,
                host: host_name,
                candidates,
            });
        });

        Completion::Pending
    }

    /// Undebounced remote completion for one-shot callers.
    pub async fn complete_remote_now(&self, partial: &str, host: &HostDescriptor) -> Vec<String> {
        let target = match host.ssh_target() {
            Some(target) => target,
            None => return Vec::new(),
        };

        let path = PartialPath::parse(partial);
        let dir = path.directory();
        let key = Self::cache_key(&target, &dir);

        let children = match self.cache.get(&key) {
            Some(children) => children,
            None => {
                match fetch_listing(self.runner.as_ref(), &target, &dir, self.listing_timeout).await
                {
                    Some(children) => {
                        self.cache.insert(key, children.clone());
                        children
                    }
                    None => return Vec::new(),
                }
            }
        };
        filter_by_prefix(&children, path.segment)
    }

    /// Warms the cache for `dir` on `host` in a detached task.
    ///
    /// Returns false when nothing was started: the host is local or
    /// ineligible, or the directory is already cached.
    pub fn prefetch(&self, dir: &str, host: &HostDescriptor) -> bool {
        if host.is_local() {
            return false;
        }
        let target = match host.ssh_target() {
            Some(target) => target,
            None => return false,
        };

        let dir = normalize_dir(dir);
        let key = Self::cache_key(&target, &dir);
        if self.cache.contains(&key) {
            tracing::debug!("prefetch skipped, {} already cached", dir);
            return false;
        }

        let runner = Arc::clone(&self.runner);
        let cache = self.cache.clone();
        let timeout = self.listing_timeout;
        tokio::spawn(async move {
            if let Some(children) = fetch_listing(runner.as_ref(), &target, &dir, timeout).await {
                tracing::debug!("prefetched {} entries for {}", children.len(), dir);
                cache.insert(key, children);
            }
        });
        true
    }

    pub fn cancel_pending(&mut self) {
        self.debouncer.cancel();
    }
}

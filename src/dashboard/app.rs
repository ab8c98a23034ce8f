use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::completion::{
    normalize_dir, resolve_tab, Completion, CompletionCache, CompletionFetcher, CompletionUpdate,
    TabResolution,
};
use crate::config::Config;
use crate::models::{HostDescriptor, LOCAL_HOST_NAME};
use crate::remote::{PollingCoordinator, RemoteRunner, SshRunner};
use crate::session::TmuxClient;
use crate::signals::SignalStore;

use super::ui::UI;
use super::widgets::{EnvironmentList, PaneSignal, PathInput, SignalDisplay};

const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub struct DashboardApp<R: RemoteRunner + 'static = SshRunner> {
    config: Config,
    config_path: Option<PathBuf>,
    coordinator: PollingCoordinator<R>,
    fetcher: CompletionFetcher<R>,
    completion_updates: mpsc::UnboundedReceiver<CompletionUpdate>,
    signal_store: SignalStore,
    tmux: TmuxClient,

    environment_list: EnvironmentList,
    signal_display: SignalDisplay,
    path_input: PathInput,

    /// `None` completes against the local filesystem.
    completion_host: Option<HostDescriptor>,
    message: Option<String>,
    running: bool,

    last_refresh: Instant,
    last_signal_poll: Option<Instant>,
}

impl DashboardApp {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        let coordinator = PollingCoordinator::from_config(&config);
        let (fetcher, updates) = CompletionFetcher::from_config(&config, CompletionCache::new());
        let mut app = Self::with_parts(config, coordinator, fetcher, updates);
        app.config_path = Some(config_path.unwrap_or_else(Config::default_config_path));
        app
    }
}

impl<R: RemoteRunner + 'static> DashboardApp<R> {
    pub fn with_parts(
        config: Config,
        coordinator: PollingCoordinator<R>,
        fetcher: CompletionFetcher<R>,
        completion_updates: mpsc::UnboundedReceiver<CompletionUpdate>,
    ) -> Self {
        let signal_store = SignalStore::from_config(&config);
        let tmux = TmuxClient::from_config(&config);

        Self {
            config,
            config_path: None,
            coordinator,
            fetcher,
            completion_updates,
            signal_store,
            tmux,
            environment_list: EnvironmentList::new(),
            signal_display: SignalDisplay::new(),
            path_input: PathInput::new(),
            completion_host: None,
            message: None,
            running: true,
            last_refresh: Instant::now(),
            last_signal_poll: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn environment_list(&self) -> &EnvironmentList {
        &self.environment_list
    }

    pub fn signal_display(&self) -> &SignalDisplay {
        &self.signal_display
    }

    pub fn path_input(&self) -> &PathInput {
        &self.path_input
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn completion_host_label(&self) -> &str {
        self.completion_host
            .as_ref()
            .map(|h| h.name.as_str())
            .unwrap_or(LOCAL_HOST_NAME)
    }

    fn sync_environments(&mut self) {
        self.environment_list
            .set_environments(self.coordinator.environments());
        self.environment_list
            .set_detecting(self.coordinator.is_detecting());
        self.environment_list
            .set_selected_host(self.completion_host.as_ref().map(|h| h.name.clone()));
    }

    /// Local first, then every available environment in configured order.
    ///
    /// A selected host that dropped out of the environments still anchors the
    /// cycle at its configured position.
    pub fn cycle_completion_host(&mut self) {
        let hosts = self.coordinator.hosts();
        let anchor = self
            .completion_host
            .as_ref()
            .and_then(|current| hosts.iter().position(|h| h.name == current.name));
        let configured_index = |name: &str| hosts.iter().position(|h| h.name == name);

        let next = self
            .coordinator
            .environments()
            .iter()
            .find(|env| match anchor {
                Some(anchor) => configured_index(&env.name).is_some_and(|i| i > anchor),
                None => true,
            })
            .cloned();

        self.completion_host = next;
        self.fetcher.cancel_pending();
        self.sync_environments();
        self.set_message(format!("Completing on {}", self.completion_host_label()));
        self.request_completions();
    }

    fn request_completions(&mut self) {
        match self
            .fetcher
            .complete(self.path_input.content(), self.completion_host.as_ref())
        {
            Completion::Ready(candidates) => self.path_input.set_candidates(candidates),
            Completion::Pending => self.path_input.set_pending(),
        }
    }

    /// Applies debounced listings that still match what is on screen.
    pub fn drain_completion_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.completion_updates.try_recv() {
            if update.input == self.path_input.content()
                && update.host == self.completion_host_label()
            {
                self.path_input.set_candidates(update.candidates);
                applied += 1;
            } else {
                tracing::trace!("dropping stale completion for {}", update.input);
            }
        }
        applied
    }

    pub fn complete_tab(&mut self) {
        let input = self.path_input.content().to_string();
        let candidates = match self.fetcher.complete(&input, self.completion_host.as_ref()) {
            Completion::Ready(candidates) => candidates,
            Completion::Pending => {
                self.path_input.set_pending();
                return;
            }
        };

        match resolve_tab(&input, &candidates) {
            TabResolution::NoOp => {
                self.path_input.set_candidates(candidates);
            }
            TabResolution::Descend(next) => {
                let prefetching = match self.completion_host.as_ref() {
                    Some(host) => self.fetcher.prefetch(&normalize_dir(&next), host),
                    None => false,
                };
                self.path_input.set_content(next);
                if prefetching {
                    self.path_input.set_candidates(Vec::new());
                } else {
                    self.request_completions();
                }
            }
            TabResolution::Extend(next) => {
                self.path_input.set_content(next);
                self.request_completions();
            }
        }
    }

    /// Re-reads the host list, drops cached listings and re-probes every
    /// eligible host.
    pub fn force_refresh(&mut self) {
        if let Some(path) = self.config_path.clone() {
            match Config::load(Some(path)) {
                Ok(config) => self.config.hosts = config.hosts,
                Err(e) => tracing::warn!("config reload failed: {:#}", e),
            }
        }

        self.fetcher.cache().clear();
        let started = self.coordinator.set_hosts(self.config.hosts.clone())
            || self.coordinator.force_refresh();
        if started {
            self.set_message("Checking environments...");
        } else {
            self.set_message("No SSH hosts configured");
        }
        self.last_refresh = Instant::now();
        self.sync_environments();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        tracing::trace!("key pressed: {:?}", key.code);

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.quit(),
                KeyCode::Char('r') => self.force_refresh(),
                KeyCode::Char('e') => self.cycle_completion_host(),
                KeyCode::Char('u') => {
                    self.path_input.clear();
                    self.fetcher.cancel_pending();
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Tab => self.complete_tab(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
                self.message = None;
                self.path_input.insert_char(c);
                self.request_completions();
            }
            KeyCode::Backspace => {
                self.path_input.delete_char();
                self.request_completions();
            }
            KeyCode::Delete => {
                self.path_input.delete_forward();
                self.request_completions();
            }
            KeyCode::Left => self.path_input.move_cursor_left(),
            KeyCode::Right => self.path_input.move_cursor_right(),
            KeyCode::Home => self.path_input.move_cursor_start(),
            KeyCode::End => self.path_input.move_cursor_end(),
            _ => {}
        }
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(EVENT_POLL_TIMEOUT)? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    async fn poll_reachability(&mut self) {
        let applied = self.coordinator.poll().await;

        if self.last_refresh.elapsed() >= self.config.polling.reachability_poll() {
            self.last_refresh = Instant::now();
            self.coordinator.refresh();
        }

        if applied > 0 {
            tracing::debug!(
                "{} environments available",
                self.coordinator.environments().len()
            );
            if self.message.as_deref() == Some("Checking environments...") {
                self.message = None;
            }
        }
        self.environment_list.tick();
        self.sync_environments();
    }

    async fn poll_signals(&mut self) {
        let due = self
            .last_signal_poll
            .map_or(true, |at| at.elapsed() >= self.config.polling.signal_poll());
        if !due {
            return;
        }
        self.last_signal_poll = Some(Instant::now());
        self.refresh_signals().await;
    }

    pub async fn refresh_signals(&mut self) {
        let running = self.tmux.session_exists().await;
        self.signal_display.set_session_running(running);
        if !running {
            self.signal_display.set_rows(Vec::new());
            return;
        }

        let mut rows = Vec::new();
        for pane in self.tmux.list_panes().await {
            let signal = self.signal_store.read(&pane.pane_id).await;
            rows.push(PaneSignal { pane, signal });
        }
        self.signal_display.set_rows(rows);
    }

    pub async fn run(&mut self) -> Result<()> {
        match self.signal_store.sweep().await {
            Ok(removed) => tracing::debug!("startup sweep removed {} signals", removed),
            Err(e) => tracing::warn!("signal sweep failed: {:#}", e),
        }

        self.coordinator.refresh();
        self.last_refresh = Instant::now();
        self.sync_environments();
        self.request_completions();

        let mut terminal = UI::setup_terminal()?;

        while self.is_running() {
            let loop_start = Instant::now();

            terminal.draw(|frame| UI::render(frame, self))?;
            self.handle_events()?;
            self.drain_completion_updates();
            self.poll_reachability().await;
            self.poll_signals().await;

            let loop_elapsed = loop_start.elapsed();
            if loop_elapsed > EVENT_POLL_TIMEOUT + Duration::from_millis(50) {
                tracing::debug!("slow loop: {}ms", loop_elapsed.as_millis());
            }
        }

        UI::restore_terminal()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::{MockReply, MockRunner};
    use crate::remote::{ReachabilityCache, ReachabilityProber};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn devbox() -> HostDescriptor {
        HostDescriptor::remote("devbox", "10.0.0.4", "dev", 22, "/keys/devbox")
    }

    fn test_app(runner: MockRunner, hosts: Vec<HostDescriptor>) -> DashboardApp<MockRunner> {
        let mut config = Config::default();
        config.hosts = hosts.clone();
        let runner = Arc::new(runner);

        let prober = ReachabilityProber::with_runner(
            MockRunner::clone(&runner),
            config.session_name.clone(),
            Duration::from_secs(7),
        );
        let coordinator = PollingCoordinator::new(prober, ReachabilityCache::new(), hosts);
        let (fetcher, updates) = CompletionFetcher::new(
            runner,
            CompletionCache::new(),
            Duration::from_millis(200),
            Duration::from_secs(5),
        );
        DashboardApp::with_parts(config, coordinator, fetcher, updates)
    }

    fn type_text(app: &mut DashboardApp<MockRunner>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[tokio::test]
    async fn escape_and_ctrl_c_quit() {
        let mut app = test_app(MockRunner::new(), vec![HostDescriptor::local()]);
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.is_running());

        let mut app = test_app(MockRunner::new(), vec![HostDescriptor::local()]);
        app.handle_key(ctrl('c'));
        assert!(!app.is_running());
    }

    #[tokio::test]
    async fn tab_descends_into_single_local_match() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("project")).unwrap();
        std::fs::create_dir(temp_dir.path().join("project").join("src")).unwrap();

        let mut app = test_app(MockRunner::new(), vec![HostDescriptor::local()]);
        type_text(&mut app, &format!("{}/pro", temp_dir.path().display()));
        app.handle_key(key(KeyCode::Tab));

        assert_eq!(
            app.path_input().content(),
            format!("{}/project/", temp_dir.path().display()),
            "tab: a single match should descend with a trailing separator"
        );
        assert_eq!(app.path_input().candidates(), ["src".to_string()]);
    }

    #[tokio::test]
    async fn tab_extends_to_common_prefix() {
        let temp_dir = TempDir::new().unwrap();
        for dir in ["foobar", "foobaz"] {
            std::fs::create_dir(temp_dir.path().join(dir)).unwrap();
        }

        let mut app = test_app(MockRunner::new(), vec![HostDescriptor::local()]);
        type_text(&mut app, &format!("{}/f", temp_dir.path().display()));
        app.handle_key(key(KeyCode::Tab));

        assert_eq!(
            app.path_input().content(),
            format!("{}/fooba", temp_dir.path().display())
        );
        assert_eq!(app.path_input().candidates().len(), 2);
    }

    #[tokio::test]
    async fn ctrl_e_without_environments_stays_local() {
        let mut app = test_app(MockRunner::new(), vec![HostDescriptor::local()]);
        app.handle_key(ctrl('e'));
        assert_eq!(app.completion_host_label(), LOCAL_HOST_NAME);
    }

    #[tokio::test]
    async fn ctrl_e_cycles_through_available_environments() {
        let runner = MockRunner::new().with_reply("10.0.0.4", MockReply::Stdout("yeehaw:running\n".into()));
        let mut app = test_app(runner, vec![HostDescriptor::local(), devbox()]);

        app.handle_key(ctrl('r'));
        assert!(app.environment_list().is_detecting());
        app.coordinator.wait().await;
        app.sync_environments();
        assert_eq!(app.environment_list().entries().len(), 1);

        app.handle_key(ctrl('e'));
        assert_eq!(app.completion_host_label(), "devbox");

        app.handle_key(ctrl('e'));
        assert_eq!(
            app.completion_host_label(),
            LOCAL_HOST_NAME,
            "cycle: should wrap back to local"
        );
    }

    #[tokio::test]
    async fn cycling_resumes_after_host_that_went_away() {
        let running = MockReply::Stdout("yeehaw:running\n".into());
        let runner = MockRunner::new()
            .with_reply("a.internal", running.clone())
            .with_reply("b.internal", running.clone())
            .with_reply("c.internal", running);
        let hosts = ["a", "b", "c"]
            .iter()
            .map(|n| HostDescriptor::remote(n, &format!("{}.internal", n), "dev", 22, "/k"))
            .collect();
        let mut app = test_app(runner.clone(), hosts);

        app.force_refresh();
        app.coordinator.wait().await;
        app.handle_key(ctrl('e'));
        app.handle_key(ctrl('e'));
        assert_eq!(app.completion_host_label(), "b");

        runner.set_reply("b.internal", MockReply::Refused);
        app.force_refresh();
        app.coordinator.wait().await;
        app.handle_key(ctrl('e'));
        assert_eq!(
            app.completion_host_label(),
            "c",
            "cycle: should continue from the vanished host's configured slot"
        );

        app.handle_key(ctrl('e'));
        assert_eq!(app.completion_host_label(), LOCAL_HOST_NAME);
    }

    #[tokio::test]
    async fn backspace_edits_instead_of_cycling_hosts() {
        let mut app = test_app(MockRunner::new(), vec![HostDescriptor::local()]);
        app.path_input.set_content("/tmp/x".to_string());
        app.handle_key(key(KeyCode::Backspace));

        assert_eq!(app.path_input().content(), "/tmp/");
        assert_eq!(app.completion_host_label(), LOCAL_HOST_NAME);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_typing_is_debounced_and_applied() {
        let runner = MockRunner::new().with_reply("10.0.0.4", MockReply::Stdout("yeehaw:running\n".into()));
        let mut app = test_app(runner.clone(), vec![devbox()]);

        app.force_refresh();
        app.coordinator.wait().await;
        app.handle_key(ctrl('e'));
        assert_eq!(app.completion_host_label(), "devbox");

        runner.set_reply("10.0.0.4", MockReply::Stdout("app\napi\nbin\n".into()));
        let calls_before = runner.call_count();
        type_text(&mut app, "/srv/a");
        assert!(app.path_input().is_pending());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(app.drain_completion_updates(), 1);
        assert_eq!(
            app.path_input().candidates(),
            ["app".to_string(), "api".to_string()]
        );
        assert_eq!(
            runner.call_count() - calls_before,
            1,
            "typing: a burst of keystrokes should list the directory once"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn descending_on_remote_host_prefetches_directory() {
        let runner = MockRunner::new().with_reply("10.0.0.4", MockReply::Stdout("yeehaw:running\n".into()));
        let mut app = test_app(runner.clone(), vec![devbox()]);
        app.force_refresh();
        app.coordinator.wait().await;
        app.handle_key(ctrl('e'));

        app.fetcher.cache().insert(
            CompletionCache::key("dev@10.0.0.4:22", "/srv"),
            vec!["app".to_string(), "bin".to_string()],
        );
        runner.set_reply("10.0.0.4", MockReply::Stdout("src\n".into()));
        let calls_before = runner.call_count();

        app.path_input.set_content("/srv/a".to_string());
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.path_input().content(), "/srv/app/");

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(
            app.fetcher
                .cache()
                .contains(&CompletionCache::key("dev@10.0.0.4:22", "/srv/app")),
            "tab: descending should warm the cache for the new directory"
        );
        assert_eq!(runner.call_count() - calls_before, 1);

        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.path_input().candidates(), ["src".to_string()]);
    }

    #[tokio::test]
    async fn ctrl_r_drops_cached_listings() {
        let mut app = test_app(MockRunner::new(), vec![HostDescriptor::local()]);
        app.fetcher
            .cache()
            .insert(CompletionCache::key("dev@10.0.0.4:22", "/srv"), Vec::new());

        app.handle_key(ctrl('r'));
        assert_eq!(app.fetcher.cache().len(), 0);
        assert_eq!(app.message(), Some("No SSH hosts configured"));
    }

    #[tokio::test]
    async fn stale_completion_updates_are_dropped() {
        let mut app = test_app(MockRunner::new(), vec![HostDescriptor::local()]);
        type_text(&mut app, "/nonexistent-yeehaw-dir/x");

        let (tx, rx) = mpsc::unbounded_channel();
        app.completion_updates = rx;
        tx.send(CompletionUpdate {
            input: "/other".to_string(),
            host: LOCAL_HOST_NAME.to_string(),
            candidates: vec!["nope".to_string()],
        })
        .unwrap();

        assert_eq!(app.drain_completion_updates(), 0);
        assert!(app.path_input().candidates().is_empty());
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::engine::error::LauncherError;
use crate::engine::models::{
    LauncherConfig, MAX_USERNAME_CHARS, ModInfo, ServerStatus, Session,
};
use crate::engine::poller::StatusPoller;
use crate::engine::state::{
    DownloadKind, LauncherEvent, LauncherSnapshot, Notice, NoticeAction, NoticeLevel, UserAction,
};
use crate::gateway::CommandGateway;
use crate::settings::LauncherSettings;

pub mod error;
pub mod models;
mod poller;
pub mod state;

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const UPDATE_PROMPT_DELAY: Duration = Duration::from_secs(2);
const BROWSE_TITLE: &str = "Select GTA San Andreas folder";

/// Owns the launcher session and sequences every workflow against the
/// command gateway. Cloning is cheap; all clones drive the same state.
#[derive(Clone)]
pub struct LauncherController {
    inner: Arc<Inner>,
}

struct Inner {
    gateway: Arc<dyn CommandGateway>,
    settings: LauncherSettings,
    state: watch::Sender<LauncherSnapshot>,
    events: mpsc::UnboundedSender<LauncherEvent>,
    prompt: Mutex<PromptTracker>,
    poller: Mutex<Option<StatusPoller>>,
    shut_down: AtomicBool,
}

// Auto-update prompt bookkeeping, keyed by mod version.
#[derive(Default)]
struct PromptTracker {
    announced_for: Option<String>,
    armed_for: Option<String>,
    dismissed_for: Option<String>,
    pending: Option<JoinHandle<()>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_join(session: &Session) -> Result<(), LauncherError> {
    if !session.install_path_valid {
        return Err(LauncherError::InvalidInstallPath);
    }
    if session.username.trim().is_empty() {
        return Err(LauncherError::EmptyUsername);
    }
    if session.username.chars().count() > MAX_USERNAME_CHARS {
        return Err(LauncherError::UsernameTooLong);
    }
    Ok(())
}

impl LauncherController {
    pub fn new(
        gateway: Arc<dyn CommandGateway>,
        settings: LauncherSettings,
    ) -> (Self, mpsc::UnboundedReceiver<LauncherEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(LauncherSnapshot::default());
        info!("controller: using {} gateway", gateway.name());
        let inner = Inner {
            gateway,
            settings,
            state,
            events,
            prompt: Mutex::new(PromptTracker::default()),
            poller: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            events_rx,
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<LauncherSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> LauncherSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn settings(&self) -> &LauncherSettings {
        &self.inner.settings
    }

    pub fn gateway_name(&self) -> &'static str {
        self.inner.gateway.name()
    }

    pub async fn handle_action(&self, action: UserAction) {
        debug!("action: {:?}", action);
        let result = match action {
            UserAction::BrowsePath => self.browse_path().await,
            UserAction::SetUsername(name) => {
                self.set_username(name);
                Ok(())
            }
            UserAction::JoinServer => self.join_server().await,
            UserAction::UpdateMod => self.update_mod().await,
            UserAction::DismissUpdatePrompt => {
                self.dismiss_update_prompt();
                Ok(())
            }
            UserAction::RefreshServerStatus => {
                self.refresh_server_status().await;
                Ok(())
            }
            UserAction::OpenDownloadPage(kind) => self.open_download_page(kind).await,
        };
        // Failures are already reported through notices.
        if let Err(err) = result
            && !err.is_rejection()
        {
            debug!("action failed: {err}");
        }
    }

    /// Startup sequence: stored config, first server check, then the stored
    /// install path and its mod version.
    pub async fn initialize(&self) {
        info!("initialize: starting");
        self.load_config().await;
        self.refresh_server_status().await;

        let install_path = self.snapshot().session.install_path;
        if !install_path.is_empty() && self.validate_path(&install_path).await {
            self.check_mod_version().await;
        }

        self.update_session(|session| session.is_loading = false);
        info!("initialize: done");
    }

    pub async fn load_config(&self) {
        match self.inner.gateway.load_config().await {
            Ok(Some(config)) => {
                info!("load_config: restoring saved session");
                if config.server() != self.inner.settings.server {
                    debug!("load_config: stored server differs from configured one; using configured");
                }
                self.update_session(|session| {
                    session.install_path = config.install_path;
                    session.username = config.username;
                });
            }
            Ok(None) => info!("load_config: no saved config"),
            Err(err) => warn!("load_config: {err}; keeping defaults"),
        }
    }

    pub async fn save_config(&self) {
        let session = self.snapshot().session;
        let server = &self.inner.settings.server;
        let config = LauncherConfig {
            install_path: session.install_path,
            username: session.username,
            server_ip: server.host.clone(),
            server_port: server.port,
        };
        match self.inner.gateway.save_config(&config).await {
            Ok(()) => debug!("save_config: saved"),
            Err(err) => warn!("save_config: {err}"),
        }
    }

    pub async fn validate_path(&self, path: &str) -> bool {
        let valid = match self.inner.gateway.validate_install_path(path).await {
            Ok(valid) => valid,
            Err(err) => {
                warn!("validate_path: {err}; treating {path:?} as invalid");
                false
            }
        };
        debug!("validate_path: {path:?} valid={valid}");
        self.update_session(|session| session.install_path_valid = valid);
        valid
    }

    pub async fn browse_path(&self) -> Result<(), LauncherError> {
        let picked = match self.inner.gateway.browse_directory(BROWSE_TITLE).await {
            Ok(picked) => picked,
            Err(err) => {
                error!("browse_path: {err}");
                self.notify(Notice::new(
                    NoticeLevel::Error,
                    "Folder selection failed",
                    "Could not open the folder picker. Please try again.",
                ));
                return Err(err.into());
            }
        };
        let Some(path) = picked.filter(|path| !path.trim().is_empty()) else {
            debug!("browse_path: cancelled");
            return Ok(());
        };

        info!("browse_path: selected {path:?}");
        self.update_session(|session| session.install_path = path.clone());
        if !self.validate_path(&path).await {
            let err = LauncherError::MissingGameExecutable;
            self.reject("Invalid folder", &err);
            return Err(err);
        }
        self.save_config().await;
        self.check_mod_version().await;
        Ok(())
    }

    pub fn set_username(&self, username: impl Into<String>) {
        let username = username.into();
        self.update_session(|session| session.username = username);
    }

    pub async fn check_mod_version(&self) {
        let install_path = self.snapshot().session.install_path;
        if install_path.is_empty() {
            debug!("check_mod_version: no install path yet");
            return;
        }
        match self.inner.gateway.check_mod_version(&install_path).await {
            Ok(info) => self.apply_mod_info(info),
            Err(err) => warn!("check_mod_version: {err}; keeping previous mod info"),
        }
    }

    pub async fn update_mod(&self) -> Result<(), LauncherError> {
        let session = self.snapshot().session;
        if !session.install_path_valid {
            let err = LauncherError::InvalidInstallPath;
            self.reject("Cannot update mod", &err);
            return Err(err);
        }
        let Some(url) = self.inner.settings.mod_download_url.clone() else {
            let err = LauncherError::ModLinkUnavailable;
            self.reject("Cannot update mod", &err);
            return Err(err);
        };

        info!("update_mod: installing from {url}");
        self.update_session(|session| session.is_updating_mod = true);
        let result = self
            .inner
            .gateway
            .download_and_install_mod(&session.install_path, &url)
            .await;
        if result.is_ok() {
            self.check_mod_version().await;
        }
        self.update_session(|session| session.is_updating_mod = false);

        match result {
            Ok(()) => {
                info!("update_mod: done");
                self.notify(Notice::new(
                    NoticeLevel::Success,
                    "Mod updated",
                    "The mod was updated successfully. Please restart the launcher.",
                ));
                Ok(())
            }
            Err(err) => {
                error!("update_mod: {err}");
                self.notify(Notice::new(
                    NoticeLevel::Error,
                    "Mod update failed",
                    "Could not update the mod. Try again or download it manually.",
                ));
                Err(err.into())
            }
        }
    }

    /// The user declined the auto-update prompt. The prompted version is
    /// remembered so later checks reporting it never prompt again.
    pub fn dismiss_update_prompt(&self) {
        let mut tracker = lock(&self.inner.prompt);
        let Some(version) = tracker.armed_for.clone() else {
            debug!("update prompt dismissed with nothing armed");
            return;
        };
        info!("update prompt dismissed for {version}");
        tracker.dismissed_for = Some(version);
    }

    pub async fn refresh_server_status(&self) -> ServerStatus {
        let server = &self.inner.settings.server;
        let status = match self
            .inner
            .gateway
            .fetch_server_status(&server.host, server.port)
            .await
        {
            Ok(status) => status,
            Err(err) => {
                warn!("refresh_server_status: {err}; marking offline");
                ServerStatus::offline(self.inner.settings.server_name.clone())
            }
        };

        let mut was_offline = false;
        self.inner.state.send_modify(|snapshot| {
            was_offline = snapshot
                .server_status
                .as_ref()
                .is_some_and(|previous| !previous.online);
            snapshot.server_status = Some(status.clone());
        });
        debug!(
            "refresh_server_status: online={} players={}/{} ping={}ms",
            status.online, status.players, status.max_players, status.ping_ms
        );
        if !status.online && !was_offline {
            self.emit(LauncherEvent::ServerOffline {
                name: status.name.clone(),
            });
        }
        status
    }

    pub async fn join_server(&self) -> Result<(), LauncherError> {
        let session = self.snapshot().session;
        if let Err(err) = check_join(&session) {
            self.reject("Cannot join server", &err);
            return Err(err);
        }

        self.update_session(|session| session.is_joining = true);
        self.save_config().await;
        let server = &self.inner.settings.server;
        let port = server.port.to_string();
        info!(
            "join_server: launching as {} to {}:{}",
            session.username, server.host, port
        );
        let result = self
            .inner
            .gateway
            .launch_process(&session.install_path, &session.username, &server.host, &port)
            .await;
        self.update_session(|session| session.is_joining = false);

        result.map_err(|err| {
            error!("join_server: {err}");
            self.notify(Notice::new(
                NoticeLevel::Error,
                "Failed to start the game",
                "Make sure GTA San Andreas is installed correctly.",
            ));
            LauncherError::from(err)
        })
    }

    pub async fn open_download_page(&self, kind: DownloadKind) -> Result<(), LauncherError> {
        let url = match kind {
            DownloadKind::GameClient => self.inner.settings.game_download_url.clone(),
            DownloadKind::ModPackage => self.inner.settings.mod_download_url.clone(),
        };
        let Some(url) = url else {
            let err = LauncherError::DownloadLinkUnavailable(kind);
            self.notify(Notice::new(
                NoticeLevel::Info,
                "Download unavailable",
                err.to_string(),
            ));
            return Err(err);
        };
        self.inner.gateway.open_external_url(&url).await.map_err(|err| {
            error!("open_download_page: {err}");
            self.notify(Notice::new(
                NoticeLevel::Error,
                "Could not open link",
                format!("Open {url} in your browser manually."),
            ));
            LauncherError::from(err)
        })
    }

    /// Start periodic server refresh. Calling it again while running is a no-op.
    pub fn start_polling(&self, period: Duration) {
        if self.is_shut_down() {
            warn!("poller: controller already shut down");
            return;
        }
        let mut slot = lock(&self.inner.poller);
        if slot.is_some() {
            debug!("poller: already running");
            return;
        }
        *slot = Some(StatusPoller::start(Arc::downgrade(&self.inner), period));
    }

    /// Stop the poller and any pending prompt. No poll runs after this returns.
    pub async fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        let poller = lock(&self.inner.poller).take();
        if let Some(poller) = poller {
            poller.stop().await;
        }
        let pending = lock(&self.inner.prompt).pending.take();
        if let Some(pending) = pending {
            pending.abort();
            let _ = pending.await;
        }
        info!("controller: shut down");
    }

    fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    fn apply_mod_info(&self, info: ModInfo) {
        debug!(
            "mod info: version={} needs_update={}",
            info.version, info.needs_update
        );
        let mut install_path_valid = false;
        self.inner.state.send_modify(|snapshot| {
            install_path_valid = snapshot.session.install_path_valid;
            snapshot.mod_info = Some(info.clone());
        });

        let mut tracker = lock(&self.inner.prompt);
        if !info.needs_update {
            if let Some(pending) = tracker.pending.take() {
                debug!("mod info: up to date; cancelling pending prompt");
                pending.abort();
            }
            return;
        }

        if tracker.announced_for.as_deref() != Some(info.version.as_str()) {
            tracker.announced_for = Some(info.version.clone());
            self.notify(
                Notice::new(
                    NoticeLevel::Warning,
                    "Mod update available",
                    format!("A newer mod is available. Installed version: {}", info.version),
                )
                .with_action(NoticeAction::UpdateMod),
            );
        }

        let wants_prompt = self.inner.settings.auto_update_mod
            && install_path_valid
            && tracker.armed_for.as_deref() != Some(info.version.as_str())
            && tracker.dismissed_for.as_deref() != Some(info.version.as_str())
            && !self.is_shut_down();
        if wants_prompt {
            tracker.armed_for = Some(info.version.clone());
            let events = self.inner.events.clone();
            let version = info.version.clone();
            info!("mod info: prompting for update of {version} shortly");
            let handle = tokio::spawn(async move {
                tokio::time::sleep(UPDATE_PROMPT_DELAY).await;
                let _ = events.send(LauncherEvent::ModUpdatePrompt { version });
            });
            if let Some(previous) = tracker.pending.replace(handle) {
                previous.abort();
            }
        }
    }

    fn update_session(&self, apply: impl FnOnce(&mut Session)) {
        self.inner
            .state
            .send_modify(|snapshot| apply(&mut snapshot.session));
    }

    fn reject(&self, title: &str, err: &LauncherError) {
        warn!("{title}: {err}");
        self.notify(Notice::new(NoticeLevel::Warning, title, err.to_string()));
    }

    fn notify(&self, notice: Notice) {
        self.emit(LauncherEvent::Notice(notice));
    }

    fn emit(&self, event: LauncherEvent) {
        if self.inner.events.send(event).is_err() {
            debug!("controller: event dropped; no listener");
        }
    }
}

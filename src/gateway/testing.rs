use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::engine::models::{LauncherConfig, ModInfo, ServerStatus};
use crate::gateway::{CommandGateway, GatewayError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    LoadConfig,
    SaveConfig(LauncherConfig),
    ValidateInstallPath(String),
    CheckModVersion(String),
    BrowseDirectory,
    FetchServerStatus(String, u16),
    DownloadAndInstallMod(String, String),
    LaunchProcess {
        path: String,
        username: String,
        host: String,
        port: String,
    },
    OpenExternalUrl(String),
}

type Probe = Box<dyn Fn() + Send + Sync>;

/// Scripted gateway that records every call it receives.
pub struct RecordingGateway {
    calls: Mutex<Vec<Call>>,
    pub stored_config: Mutex<Result<Option<LauncherConfig>, GatewayError>>,
    pub save_result: Mutex<Result<(), GatewayError>>,
    pub path_valid: Mutex<Result<bool, GatewayError>>,
    pub mod_infos: Mutex<VecDeque<Result<ModInfo, GatewayError>>>,
    pub browse_result: Mutex<Result<Option<String>, GatewayError>>,
    pub status: Mutex<Result<ServerStatus, GatewayError>>,
    pub install_result: Mutex<Result<(), GatewayError>>,
    pub launch_result: Mutex<Result<(), GatewayError>>,
    pub open_result: Mutex<Result<(), GatewayError>>,
    launch_probe: Mutex<Option<Probe>>,
    install_probe: Mutex<Option<Probe>>,
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            stored_config: Mutex::new(Ok(None)),
            save_result: Mutex::new(Ok(())),
            path_valid: Mutex::new(Ok(true)),
            mod_infos: Mutex::new(VecDeque::new()),
            browse_result: Mutex::new(Ok(None)),
            status: Mutex::new(Ok(online_status())),
            install_result: Mutex::new(Ok(())),
            launch_result: Mutex::new(Ok(())),
            open_result: Mutex::new(Ok(())),
            launch_probe: Mutex::new(None),
            install_probe: Mutex::new(None),
        }
    }
}

pub fn online_status() -> ServerStatus {
    ServerStatus {
        online: true,
        players: 75,
        max_players: 200,
        ping_ms: 35,
        name: "Indonesia Roleplay Server".into(),
    }
}

pub fn mod_info(version: &str, needs_update: bool) -> ModInfo {
    ModInfo {
        version: version.into(),
        path: "/games/gta/modpack".into(),
        needs_update,
    }
}

impl RecordingGateway {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn push_mod_info(&self, info: Result<ModInfo, GatewayError>) {
        self.mod_infos.lock().unwrap().push_back(info);
    }

    pub fn set<T>(slot: &Mutex<T>, value: T) {
        *slot.lock().unwrap() = value;
    }

    pub fn on_launch(&self, probe: impl Fn() + Send + Sync + 'static) {
        *self.launch_probe.lock().unwrap() = Some(Box::new(probe));
    }

    pub fn on_install(&self, probe: impl Fn() + Send + Sync + 'static) {
        *self.install_probe.lock().unwrap() = Some(Box::new(probe));
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CommandGateway for RecordingGateway {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn load_config(&self) -> Result<Option<LauncherConfig>, GatewayError> {
        self.record(Call::LoadConfig);
        self.stored_config.lock().unwrap().clone()
    }

    async fn save_config(&self, config: &LauncherConfig) -> Result<(), GatewayError> {
        self.record(Call::SaveConfig(config.clone()));
        self.save_result.lock().unwrap().clone()
    }

    async fn validate_install_path(&self, path: &str) -> Result<bool, GatewayError> {
        self.record(Call::ValidateInstallPath(path.to_owned()));
        self.path_valid.lock().unwrap().clone()
    }

    async fn check_mod_version(&self, path: &str) -> Result<ModInfo, GatewayError> {
        self.record(Call::CheckModVersion(path.to_owned()));
        self.mod_infos
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(mod_info("1.0.0", false)))
    }

    async fn browse_directory(&self, _title: &str) -> Result<Option<String>, GatewayError> {
        self.record(Call::BrowseDirectory);
        self.browse_result.lock().unwrap().clone()
    }

    async fn fetch_server_status(
        &self,
        host: &str,
        port: u16,
    ) -> Result<ServerStatus, GatewayError> {
        self.record(Call::FetchServerStatus(host.to_owned(), port));
        self.status.lock().unwrap().clone()
    }

    async fn download_and_install_mod(&self, path: &str, url: &str) -> Result<(), GatewayError> {
        self.record(Call::DownloadAndInstallMod(path.to_owned(), url.to_owned()));
        if let Some(probe) = self.install_probe.lock().unwrap().as_ref() {
            probe();
        }
        self.install_result.lock().unwrap().clone()
    }

    async fn launch_process(
        &self,
        path: &str,
        username: &str,
        host: &str,
        port: &str,
    ) -> Result<(), GatewayError> {
        self.record(Call::LaunchProcess {
            path: path.to_owned(),
            username: username.to_owned(),
            host: host.to_owned(),
            port: port.to_owned(),
        });
        if let Some(probe) = self.launch_probe.lock().unwrap().as_ref() {
            probe();
        }
        self.launch_result.lock().unwrap().clone()
    }

    async fn open_external_url(&self, url: &str) -> Result<(), GatewayError> {
        self.record(Call::OpenExternalUrl(url.to_owned()));
        self.open_result.lock().unwrap().clone()
    }
}

use std::path::Path;

use async_trait::async_trait;
use log::debug;

use crate::engine::models::{LauncherConfig, ModInfo, ServerStatus};
use crate::env;
use crate::gateway::{CommandGateway, GatewayError};
use crate::mods::ModService;
use crate::networking::NetworkClient;
use crate::process::ProcessLauncher;
use crate::settings::LauncherSettings;
use crate::storage::StorageManager;

/// Backend that performs the real filesystem, network and process work.
pub struct NativeGateway {
    storage: StorageManager,
    mods: ModService,
    networking: NetworkClient,
    process: ProcessLauncher,
}

impl NativeGateway {
    pub fn new(storage: StorageManager, settings: &LauncherSettings) -> Self {
        Self {
            storage,
            mods: ModService::new(settings.mod_version.clone(), settings.mod_sha256.clone()),
            networking: NetworkClient::new(settings.server_name.clone()),
            process: ProcessLauncher::new(),
        }
    }

    /// Build the native backend if its storage directory can be prepared.
    pub fn probe(settings: &LauncherSettings) -> Result<Self, String> {
        let storage = StorageManager::new(env::default_app_dir());
        storage.prepare()?;
        Ok(Self::new(storage, settings))
    }
}

#[async_trait]
impl CommandGateway for NativeGateway {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn load_config(&self) -> Result<Option<LauncherConfig>, GatewayError> {
        self.storage.read_config().await.map_err(GatewayError::Storage)
    }

    async fn save_config(&self, config: &LauncherConfig) -> Result<(), GatewayError> {
        self.storage
            .write_config(config)
            .await
            .map_err(GatewayError::Storage)
    }

    async fn validate_install_path(&self, path: &str) -> Result<bool, GatewayError> {
        if path.trim().is_empty() {
            return Ok(false);
        }
        let exe = env::game_executable(Path::new(path));
        let exists = tokio::fs::try_exists(&exe)
            .await
            .map_err(|e| GatewayError::Unreachable(format!("cannot inspect {}: {e}", exe.display())))?;
        debug!("native: {} exists={}", exe.display(), exists);
        Ok(exists)
    }

    async fn check_mod_version(&self, path: &str) -> Result<ModInfo, GatewayError> {
        self.mods
            .installed_info(Path::new(path))
            .await
            .map_err(GatewayError::VersionSource)
    }

    async fn browse_directory(&self, title: &str) -> Result<Option<String>, GatewayError> {
        let picked = rfd::AsyncFileDialog::new()
            .set_title(title)
            .pick_folder()
            .await;
        let Some(handle) = picked else {
            return Ok(None);
        };
        // The path is handed back to the game as an argument and must round-trip.
        handle
            .path()
            .to_str()
            .map(|path| Some(path.to_owned()))
            .ok_or_else(|| {
                GatewayError::Dialog(format!(
                    "selected folder {} is not valid UTF-8",
                    handle.path().display()
                ))
            })
    }

    async fn fetch_server_status(
        &self,
        host: &str,
        port: u16,
    ) -> Result<ServerStatus, GatewayError> {
        self.networking
            .server_status(host, port)
            .await
            .map_err(GatewayError::Unreachable)
    }

    async fn download_and_install_mod(&self, path: &str, url: &str) -> Result<(), GatewayError> {
        self.mods
            .install_package(Path::new(path), url)
            .await
            .map_err(GatewayError::Download)
    }

    async fn launch_process(
        &self,
        path: &str,
        username: &str,
        host: &str,
        port: &str,
    ) -> Result<(), GatewayError> {
        self.process
            .launch(Path::new(path), username, host, port)
            .map_err(GatewayError::Launch)
    }

    async fn open_external_url(&self, url: &str) -> Result<(), GatewayError> {
        open::that(url).map_err(|e| GatewayError::NoHandler(format!("{url}: {e}")))
    }
}

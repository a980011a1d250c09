use std::time::Duration;

use async_trait::async_trait;
use log::info;
use tokio::sync::Mutex;

use crate::engine::models::{DEFAULT_MAX_PLAYERS, LauncherConfig, ModInfo, ServerStatus};
use crate::gateway::{CommandGateway, GatewayError};
use crate::settings::LauncherSettings;

const SIMULATED_INSTALL: Duration = Duration::from_secs(3);
const STANDIN_INSTALL_DIR: &str = "C:/Games/GTA San Andreas";

/// Deterministic backend used when the native one is unavailable or for
/// development without a game installation.
pub struct StandInGateway {
    config: Mutex<Option<LauncherConfig>>,
    installed_version: Mutex<Option<String>>,
    reference_version: String,
    server_name: String,
}

impl StandInGateway {
    pub fn new(settings: &LauncherSettings) -> Self {
        Self {
            config: Mutex::new(None),
            installed_version: Mutex::new(None),
            reference_version: settings.mod_version.clone(),
            server_name: settings.server_name.clone(),
        }
    }
}

#[async_trait]
impl CommandGateway for StandInGateway {
    fn name(&self) -> &'static str {
        "stand-in"
    }

    async fn load_config(&self) -> Result<Option<LauncherConfig>, GatewayError> {
        Ok(self.config.lock().await.clone())
    }

    async fn save_config(&self, config: &LauncherConfig) -> Result<(), GatewayError> {
        *self.config.lock().await = Some(config.clone());
        Ok(())
    }

    async fn validate_install_path(&self, path: &str) -> Result<bool, GatewayError> {
        Ok(!path.trim().is_empty())
    }

    async fn check_mod_version(&self, path: &str) -> Result<ModInfo, GatewayError> {
        let installed = self
            .installed_version
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| self.reference_version.clone());
        Ok(ModInfo {
            needs_update: installed != self.reference_version,
            version: installed,
            path: format!("{path}/modpack"),
        })
    }

    async fn browse_directory(&self, _title: &str) -> Result<Option<String>, GatewayError> {
        Ok(Some(STANDIN_INSTALL_DIR.to_owned()))
    }

    async fn fetch_server_status(
        &self,
        _host: &str,
        _port: u16,
    ) -> Result<ServerStatus, GatewayError> {
        Ok(ServerStatus {
            online: true,
            players: 75,
            max_players: DEFAULT_MAX_PLAYERS,
            ping_ms: 35,
            name: self.server_name.clone(),
        })
    }

    async fn download_and_install_mod(&self, path: &str, url: &str) -> Result<(), GatewayError> {
        info!("stand-in: pretending to install {} into {}", url, path);
        tokio::time::sleep(SIMULATED_INSTALL).await;
        *self.installed_version.lock().await = Some(self.reference_version.clone());
        Ok(())
    }

    async fn launch_process(
        &self,
        path: &str,
        username: &str,
        host: &str,
        port: &str,
    ) -> Result<(), GatewayError> {
        info!(
            "stand-in: would launch {} as {} on {}:{}",
            path, username, host, port
        );
        Ok(())
    }

    async fn open_external_url(&self, url: &str) -> Result<(), GatewayError> {
        open::that(url).map_err(|e| GatewayError::NoHandler(format!("{url}: {e}")))
    }
}

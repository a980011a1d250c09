use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use thiserror::Error;

use crate::engine::models::{LauncherConfig, ModInfo, ServerStatus};
use crate::settings::LauncherSettings;

pub mod native;
pub mod standin;

#[cfg(test)]
pub mod testing;

pub use native::NativeGateway;
pub use standin::StandInGateway;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("config storage unavailable: {0}")]
    Storage(String),
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("mod version source unavailable: {0}")]
    VersionSource(String),
    #[error("folder dialog failed: {0}")]
    Dialog(String),
    #[error("mod download failed: {0}")]
    Download(String),
    #[error("game launch failed: {0}")]
    Launch(String),
    #[error("no handler for URL: {0}")]
    NoHandler(String),
}

/// Every privileged operation the launcher needs. The controller only ever
/// talks to the outside world through this boundary.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load_config(&self) -> Result<Option<LauncherConfig>, GatewayError>;

    async fn save_config(&self, config: &LauncherConfig) -> Result<(), GatewayError>;

    async fn validate_install_path(&self, path: &str) -> Result<bool, GatewayError>;

    async fn check_mod_version(&self, path: &str) -> Result<ModInfo, GatewayError>;

    /// `Ok(None)` means the user cancelled the dialog.
    async fn browse_directory(&self, title: &str) -> Result<Option<String>, GatewayError>;

    async fn fetch_server_status(&self, host: &str, port: u16)
    -> Result<ServerStatus, GatewayError>;

    async fn download_and_install_mod(&self, path: &str, url: &str) -> Result<(), GatewayError>;

    async fn launch_process(
        &self,
        path: &str,
        username: &str,
        host: &str,
        port: &str,
    ) -> Result<(), GatewayError>;

    async fn open_external_url(&self, url: &str) -> Result<(), GatewayError>;
}

/// Pick the backend once at start. Workflows never re-check the environment.
pub fn select(settings: &LauncherSettings, prefer_standin: bool) -> Arc<dyn CommandGateway> {
    if prefer_standin {
        info!("gateway: stand-in backend requested");
        return Arc::new(StandInGateway::new(settings));
    }
    match NativeGateway::probe(settings) {
        Ok(native) => {
            info!("gateway: using native backend");
            Arc::new(native)
        }
        Err(err) => {
            warn!("gateway: native backend unavailable ({err}); using stand-in");
            Arc::new(StandInGateway::new(settings))
        }
    }
}

use std::path::PathBuf;

use log::debug;
use tokio::fs;

use crate::engine::models::LauncherConfig;
use crate::env;

#[derive(Clone)]
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Prepare the storage directory. Fails when it cannot be created.
    pub fn prepare(&self) -> Result<(), String> {
        env::ensure_app_dir(&self.base_dir).map_err(|e| {
            format!(
                "unable to create app data dir {}: {e}",
                self.base_dir.display()
            )
        })
    }

    pub async fn read_config(&self) -> Result<Option<LauncherConfig>, String> {
        let path = env::config_path(&self.base_dir);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("storage: no config at {}", path.display());
                return Ok(None);
            }
            Err(err) => return Err(format!("failed to read config file: {err}")),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| format!("failed to parse config file: {e}"))
    }

    pub async fn write_config(&self, config: &LauncherConfig) -> Result<(), String> {
        let path = env::config_path(&self.base_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create app data directory: {e}"))?;
        }
        let bytes = serde_json::to_vec_pretty(config)
            .map_err(|e| format!("failed to serialize config: {e}"))?;
        fs::write(&path, &bytes)
            .await
            .map_err(|e| format!("failed to write config file: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LauncherConfig {
        LauncherConfig {
            install_path: "/games/gta".into(),
            username: "Player1".into(),
            server_ip: "127.0.0.1".into(),
            server_port: 7777,
        }
    }

    #[tokio::test]
    async fn missing_config_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("nested"));
        assert_eq!(storage.read_config().await.unwrap(), None);
    }

    #[tokio::test]
    async fn writes_then_reads_back_config() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("nested"));
        storage.write_config(&sample()).await.unwrap();
        assert_eq!(storage.read_config().await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn corrupt_config_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().to_path_buf());
        std::fs::write(env::config_path(dir.path()), b"{not json").unwrap();
        let err = storage.read_config().await.unwrap_err();
        assert!(err.contains("parse"), "{err}");
    }
}

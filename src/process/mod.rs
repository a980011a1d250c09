use std::path::Path;
use std::process::{Command, Stdio};

use log::{debug, info, warn};

use crate::env;

#[derive(Clone, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }

    /// Start the game client connected to `host:port` as `username`.
    pub fn launch(
        &self,
        install_dir: &Path,
        username: &str,
        host: &str,
        port: &str,
    ) -> Result<(), String> {
        let client_path = env::game_executable(install_dir);
        if !client_path.exists() {
            warn!("launch: client not found at {}", client_path.display());
            return Err(format!(
                "gta_sa.exe not found in {}",
                install_dir.display()
            ));
        }

        info!("launch: connecting {} to {}:{}", username, host, port);
        let mut cmd = launch_command(&client_path, username, host, port);
        cmd.current_dir(install_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        debug!("launch: {:?}", cmd);

        cmd.spawn()
            .map_err(|e| format!("failed to start game process: {e}"))?;
        info!("launch: process started");
        Ok(())
    }
}

fn launch_command(client_path: &Path, username: &str, host: &str, port: &str) -> Command {
    let mut command = Command::new(client_path);
    command
        .arg("-h")
        .arg(host)
        .arg("-p")
        .arg(port)
        .arg("-n")
        .arg(username);

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        // DETACHED_PROCESS
        command.creation_flags(0x00000008);
    }

    command
}

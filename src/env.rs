use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "samp-launcher";
const CONFIG_FILE: &str = "launcher-config.json";
const GAME_EXECUTABLE: &str = "gta_sa.exe";
const MOD_DIR: &str = "modpack";
const MOD_VERSION_FILE: &str = "version.txt";

/// Returns the per-user data directory the launcher persists into.
pub fn default_app_dir() -> PathBuf {
    let base = match env::consts::OS {
        "windows" => env::var_os("APPDATA")
            .or_else(|| env::var_os("LOCALAPPDATA"))
            .map(PathBuf::from),
        "macos" => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join("Library").join("Application Support")),
        _ => env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                env::var_os("HOME")
                    .map(PathBuf::from)
                    .map(|home| home.join(".local").join("share"))
            }),
    }
    .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_DIR_NAME)
}

pub fn config_path(app_dir: &Path) -> PathBuf {
    app_dir.join(CONFIG_FILE)
}

pub fn game_executable(install_dir: &Path) -> PathBuf {
    install_dir.join(GAME_EXECUTABLE)
}

pub fn mod_dir(install_dir: &Path) -> PathBuf {
    install_dir.join(MOD_DIR)
}

pub fn mod_version_file(install_dir: &Path) -> PathBuf {
    mod_dir(install_dir).join(MOD_VERSION_FILE)
}

/// Create the app data directory if it does not exist yet.
pub fn ensure_app_dir(app_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(app_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_install_layout_paths() {
        let root = Path::new("games").join("gta");
        assert_eq!(game_executable(&root), root.join("gta_sa.exe"));
        assert_eq!(
            mod_version_file(&root),
            root.join("modpack").join("version.txt")
        );
    }

    #[test]
    fn app_dir_ends_with_launcher_name() {
        assert!(default_app_dir().ends_with(APP_DIR_NAME));
    }
}

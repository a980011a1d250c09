use log::warn;

use crate::engine::models::ServerAddress;

pub const DEFAULT_SERVER_HOST: &str = "192.168.1.100";
pub const DEFAULT_SERVER_PORT: u16 = 7777;
pub const DEFAULT_SERVER_NAME: &str = "Indonesia Roleplay Server";
pub const DEFAULT_MOD_VERSION: &str = "1.0.0";

/// Launcher inputs provided by the environment. Read once at start and never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LauncherSettings {
    pub server: ServerAddress,
    pub server_name: String,
    pub mod_download_url: Option<String>,
    pub mod_sha256: Option<String>,
    pub game_download_url: Option<String>,
    pub auto_update_mod: bool,
    pub mod_version: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            server: ServerAddress {
                host: DEFAULT_SERVER_HOST.to_owned(),
                port: DEFAULT_SERVER_PORT,
            },
            server_name: DEFAULT_SERVER_NAME.to_owned(),
            mod_download_url: None,
            mod_sha256: None,
            game_download_url: None,
            auto_update_mod: false,
            mod_version: DEFAULT_MOD_VERSION.to_owned(),
        }
    }
}

impl LauncherSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let port = match non_empty("SERVER_PORT") {
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|err| {
                warn!(
                    "settings: SERVER_PORT {:?} is not a valid port ({}); using {}",
                    raw, err, DEFAULT_SERVER_PORT
                );
                DEFAULT_SERVER_PORT
            }),
            None => DEFAULT_SERVER_PORT,
        };

        Self {
            server: ServerAddress {
                host: non_empty("SERVER_IP").unwrap_or(defaults.server.host),
                port,
            },
            server_name: non_empty("SERVER_NAME").unwrap_or(defaults.server_name),
            mod_download_url: non_empty("MOD_DOWNLOAD_LINK"),
            mod_sha256: non_empty("MOD_SHA256"),
            game_download_url: non_empty("GTA_DOWNLOAD_LINK"),
            auto_update_mod: non_empty("AUTO_UPDATE_MOD").as_deref() == Some("true"),
            mod_version: non_empty("MOD_VERSION").unwrap_or(defaults.mod_version),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_from(pairs: &[(&str, &str)]) -> LauncherSettings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        LauncherSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn falls_back_to_defaults_when_unset() {
        assert_eq!(settings_from(&[]), LauncherSettings::default());
    }

    #[test]
    fn reads_all_known_variables() {
        let settings = settings_from(&[
            ("SERVER_IP", "10.0.0.5"),
            ("SERVER_PORT", "7778"),
            ("SERVER_NAME", "Test RP"),
            ("MOD_DOWNLOAD_LINK", "https://example.com/mod.zip"),
            ("GTA_DOWNLOAD_LINK", "https://example.com/gta"),
            ("AUTO_UPDATE_MOD", "true"),
            ("MOD_VERSION", "2.1.0"),
        ]);
        assert_eq!(settings.server.host, "10.0.0.5");
        assert_eq!(settings.server.port, 7778);
        assert_eq!(settings.server_name, "Test RP");
        assert_eq!(
            settings.mod_download_url.as_deref(),
            Some("https://example.com/mod.zip")
        );
        assert_eq!(
            settings.game_download_url.as_deref(),
            Some("https://example.com/gta")
        );
        assert!(settings.auto_update_mod);
        assert_eq!(settings.mod_version, "2.1.0");
    }

    #[test]
    fn invalid_port_and_blank_links_use_defaults() {
        let settings = settings_from(&[
            ("SERVER_PORT", "not-a-port"),
            ("MOD_DOWNLOAD_LINK", "   "),
            ("AUTO_UPDATE_MOD", "yes"),
        ]);
        assert_eq!(settings.server.port, DEFAULT_SERVER_PORT);
        assert!(settings.mod_download_url.is_none());
        assert!(!settings.auto_update_mod);
    }
}

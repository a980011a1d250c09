use serde::{Deserialize, Deserializer, Serialize};

pub const MAX_USERNAME_CHARS: usize = 24;
pub const DEFAULT_MAX_PLAYERS: u32 = 200;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

/// The durable subset of the session. Validity flags and network stats are
/// never part of it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    #[serde(rename = "gta_path", default, deserialize_with = "null_as_empty")]
    pub install_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub username: String,
    pub server_ip: String,
    pub server_port: u16,
}

impl LauncherConfig {
    pub fn server(&self) -> ServerAddress {
        ServerAddress {
            host: self.server_ip.clone(),
            port: self.server_port,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub install_path: String,
    pub install_path_valid: bool,
    pub username: String,
    pub is_loading: bool,
    pub is_joining: bool,
    pub is_updating_mod: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            install_path: String::new(),
            install_path_valid: false,
            username: String::new(),
            is_loading: true,
            is_joining: false,
            is_updating_mod: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerStatus {
    pub online: bool,
    pub players: u32,
    pub max_players: u32,
    pub ping_ms: u32,
    pub name: String,
}

impl ServerStatus {
    /// The record used when the server could not be reached, as opposed to
    /// never having been checked.
    pub fn offline(name: impl Into<String>) -> Self {
        Self {
            online: false,
            players: 0,
            max_players: DEFAULT_MAX_PLAYERS,
            ping_ms: 0,
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModInfo {
    pub version: String,
    pub path: String,
    pub needs_update: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_json_keys() {
        let raw = r#"{"gta_path":"C:\\Games\\GTA","username":"Player1","server_ip":"1.2.3.4","server_port":7777}"#;
        let config: LauncherConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.install_path, "C:\\Games\\GTA");
        assert_eq!(config.username, "Player1");
        assert_eq!(
            config.server(),
            ServerAddress {
                host: "1.2.3.4".into(),
                port: 7777
            }
        );
    }

    #[test]
    fn null_or_missing_optional_fields_become_empty() {
        let raw = r#"{"gta_path":null,"server_ip":"1.2.3.4","server_port":7777}"#;
        let config: LauncherConfig = serde_json::from_str(raw).unwrap();
        assert!(config.install_path.is_empty());
        assert!(config.username.is_empty());
    }

    #[test]
    fn offline_sentinel_has_zeroed_counters() {
        let status = ServerStatus::offline("RP");
        assert!(!status.online);
        assert_eq!(status.players, 0);
        assert_eq!(status.max_players, DEFAULT_MAX_PLAYERS);
        assert_eq!(status.ping_ms, 0);
        assert_eq!(status.name, "RP");
    }

    #[test]
    fn session_starts_loading_with_invalid_path() {
        let session = Session::default();
        assert!(session.is_loading);
        assert!(!session.install_path_valid);
        assert!(!session.is_joining && !session.is_updating_mod);
    }
}

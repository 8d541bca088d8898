//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/warptoggle/config.toml` by default. Everything has a
//! working default; the file is optional.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use warptoggle_core::StateText;

/// Configuration for the warptoggle client and the daemon it launches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Daemon settings.
    pub daemon: DaemonSettings,

    /// Bar text settings.
    pub display: DisplaySettings,

    /// Connection settings.
    pub server: ServerSettings,
}

/// Settings for the daemon started with `warptoggle server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    /// Name or path of the wrapped CLI executable.
    pub cli_path: String,

    /// Seconds between status checks while polling.
    pub poll_interval_secs: u64,

    /// Consecutive non-connected observations before notifying.
    pub failure_threshold: u32,

    /// Whether to deliver desktop notifications.
    pub notifications: bool,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            cli_path: "warp-cli".to_string(),
            poll_interval_secs: 10,
            failure_threshold: 5,
            notifications: true,
        }
    }
}

/// Bar text per state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Bar text while connected.
    pub connected_text: Option<String>,

    /// Bar text while a connection attempt is in flight.
    pub connecting_text: Option<String>,

    /// Bar text while disconnected.
    pub disconnected_text: Option<String>,

    /// Bar text when the daemon is unreachable.
    pub stale_text: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            connected_text: None,
            connecting_text: None,
            disconnected_text: None,
            stale_text: "WARP ?".to_string(),
        }
    }
}

impl DisplaySettings {
    /// Folds the overrides into the default state texts.
    pub fn state_text(&self) -> StateText {
        let defaults = StateText::default();
        StateText {
            connected: self.connected_text.clone().unwrap_or(defaults.connected),
            connecting: self.connecting_text.clone().unwrap_or(defaults.connecting),
            disconnected: self
                .disconnected_text
                .clone()
                .unwrap_or(defaults.disconnected),
        }
    }
}

/// Daemon connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Path to the daemon socket.
    pub socket_path: Option<PathBuf>,

    /// Connection timeout in seconds.
    pub timeout: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout: 5,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path; missing file means
    /// defaults.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("warptoggle")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = ClientConfig::default();
        assert_eq!(config.daemon.cli_path, "warp-cli");
        assert_eq!(config.daemon.poll_interval_secs, 10);
        assert_eq!(config.daemon.failure_threshold, 5);
        assert!(config.daemon.notifications);
        assert_eq!(config.server.timeout, 5);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [daemon]
            poll_interval_secs = 3

            [display]
            connected_text = "up"
            "#,
        )
        .unwrap();

        assert_eq!(config.daemon.poll_interval_secs, 3);
        assert_eq!(config.daemon.cli_path, "warp-cli");

        let texts = config.display.state_text();
        assert_eq!(texts.connected, "up");
        assert_eq!(texts.disconnected, "WARP off");
    }

    #[test]
    fn load_from_missing_file_errors() {
        let path = PathBuf::from("/nonexistent/warptoggle/config.toml");
        assert!(ClientConfig::load_from(&path).is_err());
    }

    #[test]
    fn load_from_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\ntimeout = 9\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.server.timeout, 9);
    }
}

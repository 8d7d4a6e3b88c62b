use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::protocol;

/// Daemon configuration, read from `config.toml` in the platform config
/// directory. Every field has a default so the file is optional; an
/// unreadable file is logged and ignored rather than stopping the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub socket_name: String,
    /// sound played for alarms set without one
    pub default_sound: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_name: protocol::SOCKET_NAME.to_string(),
            default_sound: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "salarmd")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    #[must_use]
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("couldn't parse {}: {e}, using defaults", path.display());
            Self::default()
        })
    }
}

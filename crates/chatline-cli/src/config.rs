//! Client configuration at `~/.chatline/config.toml`.
//!
//! Provides the server URL and channel settings.
//! CLI flags always override config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub channel: ChannelSettings,
}

/// Where the chat server lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL; the chat channel is derived from it.
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Milliseconds to wait before reconnecting a dropped channel.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl ChannelSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

fn default_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

/// `~/.chatline/config.toml`.
pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".chatline").join("config.toml"))
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tock_core::stopwatch::STOPWATCH_INTERVAL_MS;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file holding alarms.
    pub database_path: PathBuf,

    /// Stopwatch tick cadence in milliseconds.
    pub stopwatch_interval_ms: u64,

    /// Ring the terminal bell when an alarm or timer goes off.
    pub bell: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("tock.db"),
            stopwatch_interval_ms: STOPWATCH_INTERVAL_MS,
            bell: true,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TOCK_*)
        figment = figment.merge(Env::prefixed("TOCK_"));

        let config: Self = figment.extract()?;
        if config.stopwatch_interval_ms == 0 {
            return Err(figment::Error::from(
                "stopwatch_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Returns the platform-specific config directory for tock.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tock"))
}

/// Returns the platform-specific data directory for tock.
///
/// On Linux: `~/.local/share/tock`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tock"))
}

//! Configuration management for cainiao-tracker.
//!
//! Handles:
//! - Store location and corruption policy
//! - Tracking page template and allowed domain
//! - Release check settings
//! - TUI preferences

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::store::CorruptPolicy;
use crate::util::atomic_write;

/// Application directory name under the platform config/data dirs.
pub const APP_DIR_NAME: &str = "cainiao-tracker";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Local store settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Tracking page settings.
    #[serde(default)]
    pub tracking: TrackingConfig,
    /// Release check settings.
    #[serde(default)]
    pub update: UpdateConfig,
    /// TUI preferences.
    #[serde(default)]
    pub tui: TuiConfig,
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| TrackerError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| TrackerError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        atomic_write(path, content.as_bytes())
    }

    /// Resolve the store file path.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => Ok(default_data_dir()?.join(STORE_FILENAME)),
        }
    }

    /// Resolve the download directory for release assets.
    pub fn download_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.update.download_dir {
            return Ok(dir.clone());
        }
        let base = dirs::download_dir()
            .or_else(dirs::data_dir)
            .ok_or_else(|| TrackerError::unsupported("download directory discovery"))?;
        Ok(base.join("CainiaoTracker"))
    }
}

/// Store file name inside the data directory.
pub const STORE_FILENAME: &str = "store.json";

/// Local store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Explicit store file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// What to do when a stored list cannot be decoded.
    #[serde(default)]
    pub on_corrupt: CorruptPolicy,
}

/// Tracking page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Detail page the code is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Host the viewer may navigate within.
    #[serde(default = "default_allowed_domain")]
    pub allowed_domain: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            allowed_domain: default_allowed_domain(),
        }
    }
}

/// Release check configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// `owner/name` of the repository publishing releases.
    #[serde(default = "default_repository")]
    pub repository: String,
    /// Suffix identifying the installable package among release assets.
    #[serde(default = "default_asset_suffix")]
    pub asset_suffix: String,
    /// Connect timeout for the release metadata request.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// User-Agent sent to the release host.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Where downloaded packages are stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
}

impl UpdateConfig {
    /// Connect timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Latest-release endpoint for the configured repository.
    #[must_use]
    pub fn latest_release_url(&self) -> String {
        format!("{GITHUB_API}/repos/{}/releases/latest", self.repository)
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            asset_suffix: default_asset_suffix(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
            download_dir: None,
        }
    }
}

/// GitHub REST API root.
pub const GITHUB_API: &str = "https://api.github.com";

/// TUI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuiConfig {
    /// Theme name (`dark` or `light`).
    #[serde(default = "default_theme")]
    pub theme: String,
    /// How long the undo affordance stays available.
    #[serde(default = "default_undo_window")]
    pub undo_window_secs: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            undo_window_secs: default_undo_window(),
        }
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    "https://global.cainiao.com/newDetail.htm".to_string()
}

fn default_allowed_domain() -> String {
    "global.cainiao.com".to_string()
}

fn default_repository() -> String {
    "gmb7886/CainiaoTracker".to_string()
}

fn default_asset_suffix() -> String {
    ".apk".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("CainiaoTracker-CLI/{}", env!("CARGO_PKG_VERSION"))
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_undo_window() -> u64 {
    5
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| TrackerError::unsupported("config directory discovery"))?;

    Ok(config_dir.join(APP_DIR_NAME).join("config.toml"))
}

/// Get the default data directory holding the store.
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| TrackerError::unsupported("data directory discovery"))?;

    Ok(data_dir.join(APP_DIR_NAME))
}

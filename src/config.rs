//! # Configuration Module
//!
//! Settings live in a JSON file in the platform configuration directory:
//! - Linux: `~/.config/songslike/config.json`
//! - macOS: `~/Library/Application Support/songslike/config.json`
//! - Windows: `%APPDATA%\songslike\config.json`
//!
//! A missing file means defaults. Command-line flags override whatever the
//! file says. The access token is never stored here; it is read from
//! `SPOTIFY_ACCESS_TOKEN`.

use crate::algorithm::{DEFAULT_MAX_POPULARITY, MAX_PROVIDER_POPULARITY};
use crate::catalog::TimeRange;
use crate::playlist::{SelectionConfig, DEFAULT_TARGET_SIZE};
use crate::spotify::DEFAULT_API_BASE;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "songslike";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-appropriate configuration directory, creating it if
/// needed.
///
/// # Errors
///
/// Fails if the system configuration directory cannot be determined or the
/// `songslike` subdirectory cannot be created.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system config directory. Please ensure your platform supports standard config directories."
        )
    })?;

    let app_dir = config_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir).with_context(|| {
        format!(
            "Failed to create config directory at {}. Please check file permissions.",
            app_dir.display()
        )
    })?;

    Ok(app_dir)
}

/// Path of the settings file inside [`get_config_dir`].
///
/// # Errors
///
/// Same as [`get_config_dir`].
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Persistent user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Provider user id that will own created playlists
    pub user_id: Option<String>,
    /// Inclusive upper popularity bound for candidate tracks
    pub max_popularity: u32,
    /// Maximum number of tracks per playlist
    pub target_size: usize,
    /// Listening-history window for seed artists
    pub time_range: TimeRange,
    /// Optional market restriction for catalog lookups
    pub market: Option<String>,
    /// Base URL of the Web API
    pub api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_id: None,
            max_popularity: DEFAULT_MAX_POPULARITY,
            target_size: DEFAULT_TARGET_SIZE,
            time_range: TimeRange::ShortTerm,
            market: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read, parsed, or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        settings.validate()?;

        debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    /// Loads from the default location.
    ///
    /// # Errors
    ///
    /// See [`Settings::load_from`].
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Writes settings as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails on invalid settings or any filesystem error.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if `max_popularity` is above 100 or `target_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_popularity > MAX_PROVIDER_POPULARITY {
            anyhow::bail!(
                "max_popularity must be between 0 and {MAX_PROVIDER_POPULARITY}, got {}",
                self.max_popularity
            );
        }
        if self.target_size == 0 {
            anyhow::bail!("target_size must be at least 1");
        }
        Ok(())
    }

    #[must_use]
    pub fn selection(&self) -> SelectionConfig {
        SelectionConfig {
            max_popularity: self.max_popularity,
            target_size: self.target_size,
            time_range: self.time_range,
        }
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;
use watch_core::TrackerConfig;

/// Settings file layout: tracker tunables plus the simulated backends
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub tracker: TrackerConfig,
    pub simulation: SimulationConfig,
}

/// How the simulated players behave
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of every simulated video in seconds
    pub duration_secs: f64,
    /// Time the platform SDK scripts take to load
    pub sdk_delay_ms: u64,
    /// Time a constructed player takes to become ready
    pub ready_delay_ms: u64,
    /// Interval between native media time updates
    pub time_update_ms: u64,
    /// SDK scripts never load, as with a blocked network
    pub offline: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 212.0,
            sdk_delay_ms: 300,
            ready_delay_ms: 700,
            time_update_ms: 250,
            offline: false,
        }
    }
}

impl SimulationConfig {
    /// Reject video lengths the simulated clock cannot represent
    pub fn validate(&self) -> Result<()> {
        if Duration::try_from_secs_f64(self.duration_secs).is_err() {
            bail!(
                "Simulated duration must be a finite, non-negative number of seconds, got {}",
                self.duration_secs
            );
        }
        Ok(())
    }
}

/// Default settings location, e.g. `~/.config/watch-player/config.json`
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "watch-player").map(|dirs| dirs.config_dir().join("config.json"))
}

/// Load settings from `path`, or from the default location when none is given.
///
/// A missing default file yields defaults; an explicit path must exist.
pub fn load(path: Option<&Path>) -> Result<PlayerConfig> {
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => match default_path() {
            Some(path) => (path, false),
            None => return Ok(PlayerConfig::default()),
        },
    };

    if !explicit && !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(PlayerConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

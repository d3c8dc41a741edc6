//! Configuration file support for the BMI tracker.
//!
//! Configuration is loaded from `$BMI_CONFIG` if set, otherwise from
//! `$XDG_CONFIG_HOME/bmi/config.toml`. Every field has a default, so a
//! missing file or a partial one is fine.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub reminder: ReminderConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn records_path(data_dir: &Path) -> PathBuf {
        data_dir.join("records.jsonl")
    }

    pub fn reminder_path(data_dir: &Path) -> PathBuf {
        data_dir.join("reminder.json")
    }
}

/// Default canvas size for the history chart
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_width")]
    pub width: f64,

    #[serde(default = "default_chart_height")]
    pub height: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

/// Measurement reminder configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_interval_days")]
    pub interval_days: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval_days: default_interval_days(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("bmi")
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_chart_width() -> f64 {
    600.0
}

fn default_chart_height() -> f64 {
    200.0
}

fn default_interval_days() -> u32 {
    7
}

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "BMI_CONFIG";

impl Config {
    /// Load from `$BMI_CONFIG` or the standard config path
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::default_config_path())
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = toml::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values no chart or reminder could use
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !(positive(self.chart.width) && positive(self.chart.height)) {
            return Err(Error::Config(format!(
                "chart size must be positive, got {}x{}",
                self.chart.width, self.chart.height
            )));
        }
        crate::reminder::ReminderSchedule::validate_interval(self.reminder.interval_days)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn default_config_path() -> PathBuf {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(explicit);
        }
        dirs::config_dir()
            .unwrap_or_else(|| home_dir().join(".config"))
            .join("bmi")
            .join("config.toml")
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write the config through a temp file in the same directory, then
    /// rename it into place
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(self.to_toml()?.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

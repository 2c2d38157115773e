//! Configuration management with file persistence
//!
//! Configuration lives in a TOML file under the platform config directory
//! (overridable with `GYMBOOK_CONFIG_DIR`). The database location resolves
//! in order: `GYMBOOK_DB` environment variable, the `[database]` path
//! setting, then the platform default.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::storage::default_database_path;

/// Name of the environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "GYMBOOK_CONFIG_DIR";

/// Name of the environment variable overriding the database path
pub const DATABASE_ENV: &str = "GYMBOOK_DB";

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file path; empty means the platform default
    pub path: String,
}

/// Week schedule display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// First hour shown in the week grid
    pub day_start_hour: u32,
    /// Hour the week grid stops at (exclusive)
    pub day_end_hour: u32,
}

/// Gymbook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseSettings,
    pub schedule: ScheduleSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseSettings {
                path: String::new(),
            },
            schedule: ScheduleSettings {
                day_start_hour: 6,
                day_end_hour: 21,
            },
        }
    }
}

impl Config {
    /// Directory holding the config file
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(custom) = env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(custom));
        }
        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(base.join("gymbook"))
    }

    /// Full path of the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk, falling back to defaults when the
    /// file does not exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Persist configuration to disk, creating the directory if needed
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        let path = Self::config_path()?;
        let raw = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, raw)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Check invariants across settings
    pub fn validate(&self) -> Result<()> {
        if self.schedule.day_end_hour > 24 {
            bail!("schedule.day_end_hour must be at most 24");
        }
        if self.schedule.day_start_hour >= self.schedule.day_end_hour {
            bail!("schedule.day_start_hour must be before schedule.day_end_hour");
        }
        Ok(())
    }

    /// Where the database lives, after all overrides
    pub fn database_path(&self) -> PathBuf {
        if let Ok(custom) = env::var(DATABASE_ENV) {
            return PathBuf::from(custom);
        }
        if !self.database.path.is_empty() {
            return PathBuf::from(&self.database.path);
        }
        default_database_path()
    }

    /// Read one setting by its dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "database.path" => Ok(self.database.path.clone()),
            "schedule.day_start_hour" => Ok(self.schedule.day_start_hour.to_string()),
            "schedule.day_end_hour" => Ok(self.schedule.day_end_hour.to_string()),
            _ => bail!("Unknown config key: {}", key),
        }
    }

    /// Write one setting by its dotted key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "database.path" => {
                self.database.path = value.to_string();
            }
            "schedule.day_start_hour" => {
                self.schedule.day_start_hour = value
                    .parse()
                    .with_context(|| format!("Invalid hour: {}", value))?;
            }
            "schedule.day_end_hour" => {
                self.schedule.day_end_hour = value
                    .parse()
                    .with_context(|| format!("Invalid hour: {}", value))?;
            }
            _ => bail!("Unknown config key: {}", key),
        }
        self.validate()
    }

    /// All settings as (key, value) pairs, for display
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            ("database.path".to_string(), self.database.path.clone()),
            (
                "schedule.day_start_hour".to_string(),
                self.schedule.day_start_hour.to_string(),
            ),
            (
                "schedule.day_end_hour".to_string(),
                self.schedule.day_end_hour.to_string(),
            ),
        ]
    }

    /// Delete the config file, restoring defaults on next load
    pub fn reset() -> Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file {}", path.display()))?;
        }
        Ok(())
    }
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Overrides `data_dir` from the config file.
pub const DATA_DIR_ENV: &str = "WORKTRACKER_DATA_DIR";

/// Alert intervals offered in the settings dialog, in minutes. 0 turns the prompt off.
pub const ALERT_OPTIONS: [u32; 7] = [0, 1, 5, 10, 15, 30, 60];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database, logs, exports and the saved selection live here.
    pub data_dir: PathBuf,
    /// Alert interval used until the user picks one.
    pub alert_minutes: u32,
    /// How long the "still working?" prompt waits before stopping the timer.
    pub confirm_timeout_secs: u64,
    pub day_check_secs: u64,
    pub log_level: String,
    /// Ring the terminal bell when the prompt opens.
    pub bell: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<UpdateConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfig {
    pub owner: String,
    pub repo: String,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("worktracker")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            alert_minutes: 30,
            confirm_timeout_secs: 120,
            day_check_secs: 5,
            log_level: "info".to_string(),
            bell: true,
            update: None,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("worktracker")
            .join("config.toml"))
    }

    /// Load config from disk. Returns the defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            Self::parse(&raw)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            Self::default()
        };
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        if !ALERT_OPTIONS.contains(&config.alert_minutes) {
            anyhow::bail!(
                "alert_minutes must be one of {:?}, got {}",
                ALERT_OPTIONS,
                config.alert_minutes
            );
        }
        if config.confirm_timeout_secs == 0 {
            anyhow::bail!("confirm_timeout_secs must be at least 1");
        }
        Ok(config)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("worktracker.db")
    }

    pub fn selection_path(&self) -> PathBuf {
        self.data_dir.join("selection.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() -> Result<()> {
        let config = AppConfig::parse("alert_minutes = 5\n")?;
        assert_eq!(config.alert_minutes, 5);
        assert_eq!(config.confirm_timeout_secs, 120);
        assert_eq!(config.day_check_secs, 5);
        assert!(config.update.is_none());
        Ok(())
    }

    #[test]
    fn update_section_is_read() -> Result<()> {
        let config = AppConfig::parse("[update]\nowner = \"acme\"\nrepo = \"worktracker\"\n")?;
        assert_eq!(
            config.update,
            Some(UpdateConfig {
                owner: "acme".into(),
                repo: "worktracker".into(),
            })
        );
        Ok(())
    }

    #[test]
    fn unsupported_alert_interval_is_rejected() {
        assert!(AppConfig::parse("alert_minutes = 7\n").is_err());
    }

    #[test]
    fn zero_confirm_timeout_is_rejected() {
        assert!(AppConfig::parse("confirm_timeout_secs = 0\n").is_err());
        assert!(AppConfig::parse("confirm_timeout_secs = 1\n").is_ok());
    }

    #[test]
    fn defaults_survive_a_round_trip() -> Result<()> {
        let config = AppConfig::default();
        let parsed = AppConfig::parse(&toml::to_string_pretty(&config)?)?;
        assert_eq!(parsed, config);
        Ok(())
    }
}

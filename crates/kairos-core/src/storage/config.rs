//! TOML-based application configuration.
//!
//! Stored at `~/.config/kairos/config.toml`. Every field has a serde
//! default so a partial file (or none at all) still loads.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cal::CalendarKind;
use crate::error::{CoreError, Result};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Calendar system for newly created groups and date display.
    #[serde(default = "default_calendar")]
    pub default_calendar: String,
    /// First day of the week: 0 = Sunday .. 6 = Saturday.
    #[serde(default)]
    pub week_start: u8,
    /// Override for the data directory (defaults to the platform data dir).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Default color for new groups, `#rrggbb`.
    #[serde(default = "default_color")]
    pub default_color: String,
    /// Days before today covered by a new group's indexing bound.
    #[serde(default = "default_horizon_past")]
    pub horizon_past_days: i64,
    /// Days after today covered by a new group's indexing bound.
    #[serde(default = "default_horizon_future")]
    pub horizon_future_days: i64,
}

fn default_calendar() -> String {
    CalendarKind::Gregorian.as_str().to_owned()
}

fn default_color() -> String {
    "#2a76c6".into()
}

fn default_horizon_past() -> i64 {
    365
}

fn default_horizon_future() -> i64 {
    2 * 365
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str("").expect("empty config must deserialize from defaults")
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kairos").join("config.toml"))
    }

    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("kairos"))
    }

    /// The effective data directory: the override, or the platform one.
    pub fn data_dir(&self) -> Result<PathBuf> {
        self.data_dir
            .clone()
            .or_else(Self::default_data_dir)
            .ok_or_else(|| CoreError::Custom("no data directory available".into()))
    }

    pub fn default_cal_kind(&self) -> CalendarKind {
        CalendarKind::from_name(&self.default_calendar).unwrap_or(CalendarKind::Gregorian)
    }

    /// Load from the default path; missing file yields defaults, a
    /// malformed file is logged and replaced by defaults.
    pub fn load() -> Config {
        let Some(path) = Self::config_path() else {
            return Config::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).unwrap_or_else(|err| {
                log::warn!("malformed config {}: {err}; using defaults", path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| CoreError::Custom("no config directory available".into()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)
            .map_err(|err| CoreError::Custom(format!("config serialization failed: {err}")))?;
        Ok(std::fs::write(path, text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_cal_kind(), CalendarKind::Gregorian);
        assert_eq!(config.week_start, 0);
        assert_eq!(config.horizon_past_days, 365);
        assert_eq!(config.horizon_future_days, 730);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("week_start = 1\ndefault_calendar = \"jalali\"")
            .unwrap();
        assert_eq!(config.week_start, 1);
        assert_eq!(config.default_cal_kind(), CalendarKind::Jalali);
        assert_eq!(config.default_color, "#2a76c6");
    }

    #[test]
    fn test_unknown_calendar_falls_back() {
        let config: Config = toml::from_str("default_calendar = \"lunar\"").unwrap();
        assert_eq!(config.default_cal_kind(), CalendarKind::Gregorian);
    }
}

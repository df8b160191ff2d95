use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::units::{
    DistanceUnit, PrecipitationUnit, PressureUnit, SpeedUnit, TemperatureUnit,
};

/// Configuration for a single source (e.g. API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub api_key: String,
}

/// Display unit preferences, stored as unit ids so the file stays readable.
///
/// Example TOML:
/// [units]
/// temperature = "f"
/// speed = "mph"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnitPreferences {
    pub temperature: Option<String>,
    pub precipitation: Option<String>,
    pub pressure: Option<String>,
    pub speed: Option<String>,
    pub distance: Option<String>,
}

impl UnitPreferences {
    /// Resolve preferences against the location's country, falling back to
    /// the regional default when a preference is absent or unrecognized.
    pub fn temperature_unit(&self, region: &str) -> TemperatureUnit {
        self.temperature
            .as_deref()
            .and_then(TemperatureUnit::from_id)
            .unwrap_or_else(|| TemperatureUnit::default_for_region(region))
    }

    pub fn precipitation_unit(&self, region: &str) -> PrecipitationUnit {
        self.precipitation
            .as_deref()
            .and_then(PrecipitationUnit::from_id)
            .unwrap_or_else(|| PrecipitationUnit::default_for_region(region))
    }

    pub fn pressure_unit(&self, region: &str) -> PressureUnit {
        self.pressure
            .as_deref()
            .and_then(PressureUnit::from_id)
            .unwrap_or_else(|| PressureUnit::default_for_region(region))
    }

    pub fn speed_unit(&self, region: &str) -> SpeedUnit {
        self.speed
            .as_deref()
            .and_then(SpeedUnit::from_id)
            .unwrap_or_else(|| SpeedUnit::default_for_region(region))
    }

    pub fn distance_unit(&self, region: &str) -> DistanceUnit {
        self.distance
            .as_deref()
            .and_then(DistanceUnit::from_id)
            .unwrap_or_else(|| DistanceUnit::default_for_region(region))
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Per-source call timeout. Zero or absent means the built-in default.
    pub timeout_seconds: Option<u64>,

    #[serde(default)]
    pub units: UnitPreferences,

    /// Example TOML:
    /// [sources.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cumulus", "cumulus-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a source API key.
    pub fn upsert_source_api_key(&mut self, source_id: &str, api_key: String) {
        self.sources
            .insert(source_id.to_owned(), SourceConfig { api_key });
    }

    /// Returns the API key for a source, if present and non-empty.
    pub fn source_api_key(&self, source_id: &str) -> Option<&str> {
        self.sources
            .get(source_id)
            .map(|cfg| cfg.api_key.as_str())
            .filter(|k| !k.is_empty())
    }

    pub fn is_source_configured(&self, source_id: &str) -> bool {
        self.source_api_key(source_id).is_some()
    }

    pub fn call_timeout(&self) -> Option<std::time::Duration> {
        self.timeout_seconds
            .filter(|s| *s > 0)
            .map(std::time::Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_read_source_api_key() {
        let mut cfg = Config::default();
        assert_eq!(cfg.source_api_key("openweather"), None);

        cfg.upsert_source_api_key("openweather", "OPEN_KEY".into());

        assert_eq!(cfg.source_api_key("openweather"), Some("OPEN_KEY"));
        assert!(cfg.is_source_configured("openweather"));
    }

    #[test]
    fn empty_api_key_counts_as_unconfigured() {
        let mut cfg = Config::default();
        cfg.upsert_source_api_key("openweather", String::new());

        assert_eq!(cfg.source_api_key("openweather"), None);
        assert!(!cfg.is_source_configured("openweather"));
    }

    #[test]
    fn unit_preferences_fall_back_to_regional_defaults() {
        let prefs = UnitPreferences {
            temperature: Some("f".into()),
            ..UnitPreferences::default()
        };

        assert_eq!(prefs.temperature_unit("DE"), TemperatureUnit::Fahrenheit);
        // No speed preference: US default applies.
        assert_eq!(prefs.speed_unit("US"), SpeedUnit::default_for_region("US"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut cfg = Config::default();
        cfg.timeout_seconds = Some(15);
        cfg.units.temperature = Some("c".into());
        cfg.upsert_source_api_key("openweather", "KEY".into());

        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();

        assert_eq!(back.timeout_seconds, Some(15));
        assert_eq!(back.units.temperature.as_deref(), Some("c"));
        assert_eq!(back.source_api_key("openweather"), Some("KEY"));
    }

    #[test]
    fn zero_timeout_means_default() {
        let cfg = Config {
            timeout_seconds: Some(0),
            ..Config::default()
        };
        assert_eq!(cfg.call_timeout(), None);
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FuelError;
use crate::logging::LogConfig;
use crate::models::SubjectSettings;
use crate::thresholds::TREND_DEAD_BAND;

/// Default ledger window in days
pub const DEFAULT_WINDOW_DAYS: u32 = 60;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Subject used when `--subject` is omitted
    #[serde(default)]
    pub default_subject: Option<String>,

    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Where ledger data lives
    #[serde(default)]
    pub storage: StorageSettings,

    /// Ledger run settings
    #[serde(default)]
    pub ledger: LedgerSettings,

    /// Settings applied to subjects with nothing stored
    #[serde(default)]
    pub defaults: SubjectSettings,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database file
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Days before the end date included in a recompute
    pub window_days: u32,

    /// Slope (g/day) within which the debt trend counts as stable
    pub trend_dead_band_g: Decimal,

    /// Show a progress bar during recompute
    pub show_progress: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            default_subject: None,
            metadata: ConfigMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: now,
                updated_at: now,
            },
            storage: StorageSettings::default(),
            ledger: LedgerSettings::default(),
            defaults: SubjectSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: AppConfig::config_dir().join("fuelrs.db"),
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            trend_dead_band_g: TREND_DEAD_BAND,
            show_progress: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content).map_err(|err| {
            FuelError::Configuration(format!("{}: {}", path.as_ref().display(), err))
        })?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fuelrs")
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(&Self::default_config_path())
    }

    /// Load `path` if it exists and parses, otherwise defaults
    pub fn load_or_default_from(path: &Path) -> Self {
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "using default configuration");
                Self::default()
            }
        }
    }

    /// Settings for a subject: stored values when present, else configured defaults
    pub fn settings_for(&self, stored: Option<SubjectSettings>) -> SubjectSettings {
        stored.unwrap_or_else(|| self.defaults.clone())
    }

    /// Resolve the subject from a CLI argument or the configured default
    pub fn subject_or_default(&self, subject: Option<String>) -> Result<String> {
        subject
            .or_else(|| self.default_subject.clone())
            .ok_or_else(|| {
                FuelError::Configuration(
                    "no subject given and no default_subject configured".to_string(),
                )
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.ledger.window_days, 60);
        assert_eq!(parsed.ledger.trend_dead_band_g, dec!(10));
        assert_eq!(parsed.storage, config.storage);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
default_subject = "athlete-1"

[metadata]
version = "0.1.0"
created_at = "2024-03-01T00:00:00Z"
updated_at = "2024-03-01T00:00:00Z"

[ledger]
window_days = 30

[defaults]
weight_kg = 62.5
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ledger.window_days, 30);
        assert!(config.ledger.show_progress);
        assert_eq!(config.defaults.weight_kg, Some(62.5));
        assert_eq!(config.subject_or_default(None).unwrap(), "athlete-1");
        assert_eq!(
            config.subject_or_default(Some("other".to_string())).unwrap(),
            "other"
        );
    }

    #[test]
    fn test_settings_for_prefers_stored() {
        let mut config = AppConfig::default();
        config.defaults.weight_kg = Some(60.0);

        assert_eq!(config.settings_for(None).weight_kg, Some(60.0));
        let stored = SubjectSettings {
            weight_kg: Some(80.0),
            ..Default::default()
        };
        assert_eq!(config.settings_for(Some(stored)).weight_kg, Some(80.0));
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.default_subject = Some("athlete-1".to_string());
        config.save_to_file(&config_path).unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.default_subject.as_deref(), Some("athlete-1"));

        let missing = AppConfig::load_or_default_from(&temp_dir.path().join("none.toml"));
        assert_eq!(missing.default_subject, None);
    }

    #[test]
    fn test_config_failures_are_configuration_errors() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "default_subject = [unterminated").unwrap();

        let err = AppConfig::load_from_file(&config_path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FuelError>(),
            Some(FuelError::Configuration(_))
        ));
        let fallback = AppConfig::load_or_default_from(&config_path);
        assert_eq!(fallback.default_subject, None);
        assert_eq!(fallback.ledger.window_days, DEFAULT_WINDOW_DAYS);

        let err = AppConfig::default().subject_or_default(None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FuelError>(),
            Some(FuelError::Configuration(_))
        ));
    }
}

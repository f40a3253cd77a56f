//! Configuration file support for fittrack.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fittrack/config.toml`.
//! Every section is optional.

use crate::{Error, IntensityRates, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub reporting: ReportingConfig,

    #[serde(default)]
    pub energy: EnergyConfig,

    #[serde(default)]
    pub activities: ActivitiesConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_database_file")]
    pub database_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
        }
    }
}

/// Progress report defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Days shown when no explicit range is given
    #[serde(default = "default_range_days")]
    pub default_range_days: u32,

    /// Width of the longest bar in text charts
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            default_range_days: default_range_days(),
            chart_width: default_chart_width(),
        }
    }
}

/// Calorie burn rates for weightlifting sessions (kcal per minute)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnergyConfig {
    #[serde(default = "default_weightlifting_light")]
    pub weightlifting_light: f64,

    #[serde(default = "default_weightlifting_moderate")]
    pub weightlifting_moderate: f64,

    #[serde(default = "default_weightlifting_intense")]
    pub weightlifting_intense: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            weightlifting_light: default_weightlifting_light(),
            weightlifting_moderate: default_weightlifting_moderate(),
            weightlifting_intense: default_weightlifting_intense(),
        }
    }
}

impl EnergyConfig {
    pub fn weightlifting_rates(&self) -> IntensityRates {
        IntensityRates::new(
            self.weightlifting_light,
            self.weightlifting_moderate,
            self.weightlifting_intense,
        )
    }
}

/// Activity available to every user of this installation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfiguredActivity {
    pub name: String,
    pub light: f64,
    pub moderate: f64,
    pub intense: f64,
}

impl ConfiguredActivity {
    pub fn rates(&self) -> IntensityRates {
        IntensityRates::new(self.light, self.moderate, self.intense)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ActivitiesConfig {
    #[serde(default)]
    pub custom: Vec<ConfiguredActivity>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("fittrack")
}

fn default_database_file() -> String {
    "fittrack.db".into()
}

fn default_range_days() -> u32 {
    30
}

fn default_chart_width() -> usize {
    40
}

fn default_weightlifting_light() -> f64 {
    4.0
}

fn default_weightlifting_moderate() -> f64 {
    6.0
}

fn default_weightlifting_intense() -> f64 {
    10.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("fittrack").join("config.toml")
    }

    /// Path of the SQLite database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data.data_dir.join(&self.data.database_file)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.database_file.trim().is_empty() {
            return Err(Error::Config("data.database_file must not be empty".into()));
        }
        if self.reporting.default_range_days == 0 {
            return Err(Error::Config(
                "reporting.default_range_days must be at least 1".into(),
            ));
        }
        if self.reporting.chart_width < 10 {
            return Err(Error::Config(
                "reporting.chart_width must be at least 10".into(),
            ));
        }
        self.energy
            .weightlifting_rates()
            .validate()
            .map_err(|e| Error::Config(format!("energy: {}", e)))?;
        for activity in &self.activities.custom {
            if activity.name.trim().is_empty() {
                return Err(Error::Config("activities.custom entry without a name".into()));
            }
            activity
                .rates()
                .validate()
                .map_err(|e| Error::Config(format!("activity '{}': {}", activity.name, e)))?;
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.reporting.default_range_days, 30);
        assert_eq!(config.energy.weightlifting_moderate, 6.0);
        assert!(config.activities.custom.is_empty());
        assert!(config.database_path().ends_with("fittrack.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.reporting.chart_width = 60;
        config.activities.custom.push(ConfiguredActivity {
            name: "Rowing".into(),
            light: 6.0,
            moderate: 9.0,
            intense: 12.0,
        });
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.reporting.chart_width, 60);
        assert_eq!(parsed.activities.custom.len(), 1);
        assert_eq!(parsed.activities.custom[0].rates().intense, 12.0);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[reporting]
default_range_days = 7
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.reporting.default_range_days, 7);
        assert_eq!(config.reporting.chart_width, 40); // default
        assert_eq!(config.data.database_file, "fittrack.db");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[reporting]\ndefault_range_days = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        std::fs::write(&path, "[energy]\nweightlifting_light = -1.0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}

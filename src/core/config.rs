use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default output file, written to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "absher_guardian_50000_no_event.csv";

/// Error while loading, parsing, or validating a config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config io error: {err}"),
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Top-level generator configuration.
///
/// Every field has a default, so an empty file (or no file at all) yields the
/// stock 50 000-user dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optional RNG seed for deterministic output.
    pub seed: Option<u64>,
    /// Population size and sampling probabilities.
    pub dataset: DatasetConfig,
    /// Overrides for the categorical tables.
    pub catalog: CatalogConfig,
    /// Output sink configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Loads and validates a config file from TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dataset.validate()?;
        self.catalog.validate()
    }
}

/// Population size and per-event sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Number of simulated users.
    pub users: u32,
    /// Identifier of the first user; later users count up from here.
    pub first_user_id: u32,
    /// Minimum number of service events per user (inclusive).
    pub min_logs: u32,
    /// Maximum number of service events per user (inclusive).
    pub max_logs: u32,
    pub min_age: u8,
    pub max_age: u8,
    /// Chance that the login event uses one of the user's known devices.
    pub login_known_device_probability: f64,
    /// Chance that a service event uses one of the user's known devices.
    pub service_known_device_probability: f64,
    /// Chance that an event originates from the user's home city.
    pub home_location_probability: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            users: 50_000,
            first_user_id: 1001,
            min_logs: 3,
            max_logs: 8,
            min_age: 18,
            max_age: 75,
            login_known_device_probability: 0.8,
            service_known_device_probability: 0.75,
            home_location_probability: 0.8,
        }
    }
}

impl DatasetConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.min_logs > self.max_logs {
            return Err(ConfigError::Invalid(format!(
                "min_logs ({}) exceeds max_logs ({})",
                self.min_logs, self.max_logs
            )));
        }
        if self.min_age > self.max_age {
            return Err(ConfigError::Invalid(format!(
                "min_age ({}) exceeds max_age ({})",
                self.min_age, self.max_age
            )));
        }
        if self.first_user_id.checked_add(self.users).is_none() {
            return Err(ConfigError::Invalid("user id range overflows u32".to_string()));
        }
        for (name, value) in [
            ("login_known_device_probability", self.login_known_device_probability),
            ("service_known_device_probability", self.service_known_device_probability),
            ("home_location_probability", self.home_location_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Optional overrides for the categorical tables; `None` keeps the built-in list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub cities: Option<Vec<String>>,
    pub services: Option<Vec<String>>,
    pub browsers: Option<Vec<String>>,
    pub oses: Option<Vec<String>>,
    pub locales: Option<Vec<String>>,
    pub screen_resolutions: Option<Vec<String>>,
    /// Weights for the Low/Medium/High IP risk tiers.
    pub ip_risk_weights: Option<[f64; 3]>,
}

impl CatalogConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, values) in [
            ("cities", &self.cities),
            ("services", &self.services),
            ("browsers", &self.browsers),
            ("oses", &self.oses),
            ("locales", &self.locales),
            ("screen_resolutions", &self.screen_resolutions),
        ] {
            if matches!(values, Some(list) if list.is_empty()) {
                return Err(ConfigError::Invalid(format!("catalog.{name} is empty")));
            }
        }
        if let Some(weights) = &self.ip_risk_weights {
            if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "catalog.ip_risk_weights must be finite and non-negative, got {weights:?}"
                )));
            }
            if weights.iter().sum::<f64>() <= 0.0 {
                return Err(ConfigError::Invalid("catalog.ip_risk_weights sum to zero".to_string()));
            }
        }
        Ok(())
    }
}

/// Output sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file path.
    pub path: String,
    /// Output format selection.
    pub format: FormatConfig,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT_PATH.to_string(),
            format: FormatConfig::Csv(FormatOptions::default()),
        }
    }
}

/// Output format selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormatConfig {
    Csv(FormatOptions),
}

/// Per-format options (compression, etc.).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatOptions {
    pub compression: Option<String>,
}

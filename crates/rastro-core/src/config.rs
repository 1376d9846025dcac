//! Application configuration management.
//!
//! Handles loading, saving, and validating the node configuration:
//! - Target beacon service UUID and scanner timing
//! - Simulated source windows (intervals, minor ids, RSSI)
//! - Advisory trigger probability, model, and timezone
//! - Optional fixed location coordinates
//! - HTTP server port
//! - Log level and optional log file directory

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::LocationFix;

/// Service UUID shared by all beacon source variants as the advertisement
/// filter. Matches the beacons distributed by the tracking association.
pub const DEFAULT_TARGET_SERVICE_UUID: Uuid = Uuid::from_u128(0xF001_2345_0000_0000_0000_0000_0000_0000);

/// Configuration-specific error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading the configuration file failed.
    #[error("failed to read {}: {source}", .path.display())]
    ReadError {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the configuration file failed.
    #[error("failed to write {}: {source}", .path.display())]
    WriteError {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Serializing the configuration to TOML failed.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(String),

    /// A field holds a value outside its allowed range.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// The offending field, dotted-path style (e.g. `advisory.probability`).
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanner behavior.
    pub scanner: ScannerConfig,

    /// Simulated beacon source windows.
    pub simulation: SimulationConfig,

    /// Advisory trigger and client settings.
    pub advisory: AdvisoryConfig,

    /// Optional fixed device location.
    pub location: LocationConfig,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// Log output settings.
    pub log: LogConfig,
}

/// Scanner behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Service UUID to filter advertisements on.
    pub target_service_uuid: Uuid,

    /// How long the scanner displays `Detected` before returning to
    /// `Scanning` after the most recent sighting, in milliseconds.
    pub settle_delay_ms: u64,

    /// Use the simulated source instead of BlueZ scanning.
    pub use_simulation: bool,

    /// When BlueZ activation fails, reset and retry with the simulated
    /// source instead of staying in the error state.
    pub fallback_to_simulation: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            target_service_uuid: DEFAULT_TARGET_SERVICE_UUID,
            settle_delay_ms: 2000,
            use_simulation: true,
            fallback_to_simulation: true,
        }
    }
}

impl ScannerConfig {
    /// The settle delay as a [`Duration`].
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Windows for the simulated beacon source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Minimum delay between simulated sightings, in milliseconds.
    pub min_interval_ms: u64,

    /// Maximum delay between simulated sightings, in milliseconds.
    pub max_interval_ms: u64,

    /// Smallest minor id a simulated sighting may carry.
    pub min_minor_id: u16,

    /// Largest minor id a simulated sighting may carry.
    pub max_minor_id: u16,

    /// Weakest simulated signal strength, in dBm.
    pub min_rssi_dbm: i16,

    /// Strongest simulated signal strength, in dBm.
    pub max_rssi_dbm: i16,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 8000,
            max_interval_ms: 15_000,
            min_minor_id: 1000,
            max_minor_id: 9999,
            min_rssi_dbm: -90,
            max_rssi_dbm: -50,
        }
    }
}

/// Advisory trigger and client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Probability that a detection triggers an advisory request (0..=1).
    pub probability: f64,

    /// Generative model identifier.
    pub model: String,

    /// API key for the generative service. When absent, every advisory
    /// request fails and the coordinator shows the fallback text.
    pub api_key: Option<String>,

    /// Timezone used to format the local time in advisory context strings.
    #[serde(with = "timezone_serde")]
    pub timezone: Tz,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            probability: 0.3,
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            timezone: chrono_tz::Europe::Madrid,
        }
    }
}

/// Optional fixed device location.
///
/// A headless node has no GPS; when coordinates are configured they stand
/// in for the device fix, otherwise every location request fails and events
/// carry no location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,

    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,

    /// Estimated accuracy in meters.
    pub accuracy_m: Option<f64>,
}

impl LocationConfig {
    /// The configured coordinates as a [`LocationFix`], if both are set.
    #[must_use]
    pub fn fix(&self) -> Option<LocationFix> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(LocationFix {
                latitude,
                longitude,
                accuracy_m: self.accuracy_m,
            }),
            _ => None,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port the REST API listens on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive applied when the `RASTRO_LOG_LEVEL` environment
    /// variable is unset (e.g. `info` or `rastro_core=debug,info`).
    pub level: String,

    /// Directory for daily JSON log files. Stdout-only when unset; the
    /// node runs under systemd and journald captures stdout.
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            simulation: SimulationConfig::default(),
            advisory: AdvisoryConfig::default(),
            location: LocationConfig::default(),
            server: ServerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    /// when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// validated.
    pub fn load_or_default() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific path, falling back to defaults
    /// when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// validated.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteError {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| ConfigError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::ValidationError`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scanner.settle_delay_ms == 0 {
            return Err(ConfigError::ValidationError {
                field: "scanner.settle_delay_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.simulation.min_interval_ms > self.simulation.max_interval_ms {
            return Err(ConfigError::ValidationError {
                field: "simulation.min_interval_ms".into(),
                message: "must not exceed max_interval_ms".into(),
            });
        }
        if self.simulation.min_minor_id > self.simulation.max_minor_id {
            return Err(ConfigError::ValidationError {
                field: "simulation.min_minor_id".into(),
                message: "must not exceed max_minor_id".into(),
            });
        }
        if self.simulation.min_rssi_dbm > self.simulation.max_rssi_dbm {
            return Err(ConfigError::ValidationError {
                field: "simulation.min_rssi_dbm".into(),
                message: "must not exceed max_rssi_dbm".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.advisory.probability) {
            return Err(ConfigError::ValidationError {
                field: "advisory.probability".into(),
                message: "must be within 0.0..=1.0".into(),
            });
        }
        if self.location.latitude.is_some() != self.location.longitude.is_some() {
            return Err(ConfigError::ValidationError {
                field: "location".into(),
                message: "latitude and longitude must be set together".into(),
            });
        }
        Ok(())
    }

    /// Get the configuration file path.
    ///
    /// On Linux nodes: `/etc/rastro/config.toml`.
    /// For development elsewhere: `~/.config/rastro/config.toml`.
    #[must_use]
    pub fn config_path() -> PathBuf {
        #[cfg(target_os = "linux")]
        {
            PathBuf::from("/etc/rastro/config.toml")
        }
        #[cfg(not(target_os = "linux"))]
        {
            directories::ProjectDirs::from("", "", "rastro")
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .unwrap_or_else(|| PathBuf::from("./config.toml"))
        }
    }
}

mod timezone_serde {
    use chrono_tz::Tz;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tz, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

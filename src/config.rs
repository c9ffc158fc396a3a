//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Config file the binary falls back to when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Packet log storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl StorageConfig {
    /// Full path of the active packet log.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        Path::new(&self.log_dir).join(&self.log_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_file: default_log_file(),
        }
    }
}

/// Transmitter device configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default = "default_device_address")]
    pub address: String,

    #[serde(default = "default_device_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: default_device_address(),
            timeout_ms: default_device_timeout_ms(),
        }
    }
}

/// Status reporting configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

/// Artifact generation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_bin_width_m")]
    pub bin_width_m: f64,

    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,

    #[serde(default = "default_artifacts_on_exit")]
    pub artifacts_on_exit: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bin_width_m: default_bin_width_m(),
            artifacts_dir: default_artifacts_dir(),
            artifacts_on_exit: default_artifacts_on_exit(),
        }
    }
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115_200 }
fn default_poll_interval_ms() -> u64 { 100 }

fn default_log_dir() -> String { "PacketsInfoFiles".to_string() }
fn default_log_file() -> String { "packets_info.json".to_string() }

fn default_device_address() -> String { "192.168.4.1".to_string() }
fn default_device_timeout_ms() -> u64 { 10_000 }

fn default_refresh_interval_ms() -> u64 { 1000 }

fn default_bin_width_m() -> f64 { 15.0 }
fn default_artifacts_dir() -> String { "GraphsFiles".to_string() }
fn default_artifacts_on_exit() -> bool { true }

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lora_monitor::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given; otherwise use [`DEFAULT_CONFIG_PATH`] when
    /// present, or fall back to the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns error when an explicitly given or existing default file
    /// cannot be loaded or does not validate.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            return Self::load(DEFAULT_CONFIG_PATH);
        }

        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Validate serial configuration
        if self.serial.port.is_empty() {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("serial port cannot be empty")
            ));
        }

        if ![9600, 19200, 38400, 57600, 115_200, 230_400, 460_800, 921_600]
            .contains(&self.serial.baud_rate)
        {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom(
                    "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600"
                )
            ));
        }

        if self.serial.poll_interval_ms == 0 || self.serial.poll_interval_ms > 10000 {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("poll_interval_ms must be between 1 and 10000")
            ));
        }

        // Validate storage configuration
        if self.storage.log_dir.is_empty() {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("storage log_dir cannot be empty")
            ));
        }

        if self.storage.log_file.is_empty() {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("storage log_file cannot be empty")
            ));
        }

        // The log listing only picks up .json files
        if !self.storage.log_file.ends_with(".json") {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("storage log_file must end in .json")
            ));
        }

        // Validate device configuration
        if self.device.address.is_empty() {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("device address cannot be empty")
            ));
        }

        if self.device.timeout_ms == 0 || self.device.timeout_ms > 60000 {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("device timeout_ms must be between 1 and 60000")
            ));
        }

        // Validate display configuration
        if self.display.refresh_interval_ms == 0 || self.display.refresh_interval_ms > 60000 {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("refresh_interval_ms must be between 1 and 60000")
            ));
        }

        // Validate analysis configuration
        if !self.analysis.bin_width_m.is_finite() || self.analysis.bin_width_m <= 0.0 {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("bin_width_m must be a positive number")
            ));
        }

        if self.analysis.artifacts_dir.is_empty() {
            return Err(crate::error::MonitorError::Config(
                toml::de::Error::custom("artifacts_dir cannot be empty")
            ));
        }

        Ok(())
    }
}

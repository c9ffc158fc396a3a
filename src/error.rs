//! # Error Types
//!
//! Custom error types for the LoRa monitor using `thiserror`.
//!
//! Expected conditions are deliberately not errors: an unrecognized serial
//! line is a silent non-match (see [`crate::telemetry::parser`]) and an
//! unreadable packet log loads as an empty sequence (see [`crate::store`]).
//! The variants here cover the failures that are worth surfacing to the host.

use thiserror::Error;

/// Main error type for the LoRa monitor
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No usable serial port among the configured paths
    #[error("Serial port not found, tried: {0}")]
    SerialPortNotFound(String),

    /// Packet log or artifact file cannot be written (permissions, disk full)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Outbound device configuration request failed
    #[error("Device request failed: {0}")]
    Device(String),

    /// Channel message is not valid JSON
    #[error("Channel message error: {0}")]
    Channel(#[from] serde_json::Error),
}

/// Result type alias for the LoRa monitor
pub type Result<T> = std::result::Result<T, MonitorError>;

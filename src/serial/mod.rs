//! # Serial Communication Module
//!
//! Handles serial communication with the LoRa receiver module.
//!
//! This module handles:
//! - Opening the serial port at the configured baud rate (115,200 default)
//! - Framing the async byte stream into trimmed text lines
//! - Listing candidate ports when the configured one is missing

pub mod line_source;

#[cfg(test)]
pub use line_source::mocks;
pub use line_source::{LineFramer, LineSource};

use std::time::Duration;

use async_trait::async_trait;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{MonitorError, Result};

/// Baud rate the receiver firmware ships with (115,200 baud)
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Device paths tried after the configured one (in order of preference)
const FALLBACK_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters (most common for LoRa boards)
    "/dev/ttyACM0", // USB CDC devices
];

/// LoRa Receiver Serial Port Handler
///
/// Manages the connection to the receiver module via USB serial and frames
/// its output into text lines.
pub struct LoraSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Reassembles lines from the byte stream
    framer: LineFramer,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for LoraSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoraSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl LoraSerial {
    /// Open the connection to the receiver module.
    ///
    /// Tries the configured port first, then the common fallback paths.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::SerialPortNotFound`] when no candidate path
    /// can be opened.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut paths: Vec<&str> = vec![config.port.as_str()];
        for path in FALLBACK_DEVICE_PATHS {
            if *path != config.port {
                paths.push(path);
            }
        }

        Self::open_with_paths(
            &paths,
            config.baud_rate,
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    /// Open the first path that accepts the connection.
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed, 115,200 for the stock firmware
    /// * `read_timeout` - Blocking read timeout handed to the driver
    pub fn open_with_paths(
        paths: &[&str],
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate, read_timeout) {
                Ok(port) => {
                    info!("Successfully opened LoRa receiver at {}", path);
                    return Ok(Self {
                        port,
                        framer: LineFramer::new(),
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(MonitorError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port with the receiver's 8N1 settings.
    fn open_port(
        path: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(read_timeout)
            .open_native_async()
            .map_err(|e| MonitorError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Names of the serial ports currently present on the system.
    ///
    /// Used for the startup error report when the configured port is
    /// missing. Enumeration failures list as empty.
    #[must_use]
    pub fn available_ports() -> Vec<String> {
        match tokio_serial::available_ports() {
            Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
            Err(e) => {
                debug!("Failed to enumerate serial ports: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl LineSource for LoraSerial {
    /// Next line from the receiver.
    ///
    /// Cancel-safe: bytes for a partial line stay in the framer across a
    /// dropped future, so a `select!` caller never loses data.
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        use tokio::io::AsyncReadExt;

        loop {
            if let Some(line) = self.framer.pop_line() {
                return Ok(Some(line));
            }

            let read = self.port.read_buf(self.framer.buffer()).await?;
            if read == 0 {
                return Ok(self.framer.finish());
            }
        }
    }
}

//! # LoRa Monitor
//!
//! Monitor the desktop side of a LoRa telemetry link.
//!
//! This application reads receiver telemetry from a serial port, keeps a JSON
//! packet log on disk, and reduces the log into plot-ready artifacts on exit.

use anyhow::Result;
use std::path::Path;
use tokio::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use lora_monitor::analysis;
use lora_monitor::config::Config;
use lora_monitor::serial::LoraSerial;
use lora_monitor::settings::LinkSettings;
use lora_monitor::store;
use lora_monitor::telemetry::ingest;

/// Name of the log file that mirrors console output in the working directory
const LOG_FILE_NAME: &str = "app.log";

/// Main entry point for the LoRa monitor application
///
/// Initializes the application and runs the ingest loop that reads receiver
/// telemetry from the serial port and appends finished packets to the JSON
/// packet log.
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging to stdout and `app.log`
///    - Load configuration from the path given as the first argument,
///      `config/default.toml`, or built-in defaults
///    - Prepare the packet log (create it when missing, probe the directory)
///    - Open the serial connection to the LoRa receiver
///
/// 2. **Main Loop**
///    - Parse receiver lines into settings updates and telemetry packets
///    - Stamp each packet with the current radio settings and append it to
///      the packet log
///    - Log running counters at the configured status interval
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Shutdown**
///    - Reduce the packet log into SNR and RSSI series artifacts and the
///      flight map, when enabled
///    - Log session totals
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be read or fails validation
/// - The packet log cannot be created
/// - No serial port can be opened (receiver not connected)
/// - The serial link drops mid-session
///
/// # Examples
///
/// Run the application:
/// ```bash
/// cargo run --release
/// ```
///
/// Expected output:
/// ```text
/// INFO lora_monitor: LoRa monitor v0.1.0 starting...
/// INFO lora_monitor::serial: Successfully opened LoRa receiver at /dev/ttyUSB0
/// INFO lora_monitor: LoRa receiver serial port opened at: /dev/ttyUSB0
/// INFO lora_monitor::telemetry::ingest: link status: 42 stored, 1 applied, 0 ignored, 0 dropped
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stdout and a file next to the process
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE_NAME);
    let (log_file, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(log_file),
        )
        .init();

    info!("LoRa monitor v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_default(std::env::args().nth(1).as_deref())?;

    // Prepare the packet log
    let log_path = config.storage.log_path();
    if !log_path.exists() {
        store::create_empty(&log_path)?;
        info!("Created packet log at {}", log_path.display());
    }
    if let Err(e) = store::probe_writable(Path::new(&config.storage.log_dir)) {
        warn!("Packet log directory check failed: {}", e);
    }
    info!("Packet log holds {} records", store::load(&log_path).len());

    // Initialize serial communication
    let mut serial = match LoraSerial::open(&config.serial) {
        Ok(serial) => serial,
        Err(e) => {
            let ports = LoraSerial::available_ports();
            if ports.is_empty() {
                error!("{} (no serial ports detected)", e);
            } else {
                error!("{} (detected ports: {})", e, ports.join(", "));
            }
            return Err(e.into());
        }
    };
    info!("LoRa receiver serial port opened at: {}", serial.device_path());
    info!("Press Ctrl+C to exit");

    let mut settings = LinkSettings::default();
    let status_interval = Duration::from_millis(config.display.refresh_interval_ms);

    // Main ingest loop
    let outcome = tokio::select! {
        result = ingest::run(&mut serial, &mut settings, &log_path, status_interval) => {
            result.map(Some)
        }

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            Ok(None)
        }
    };

    // Reduce the session log into plot-ready artifacts
    if config.analysis.artifacts_on_exit {
        let packets = store::load(&log_path);
        match analysis::write_artifacts(&packets, &config.analysis) {
            Ok(written) => {
                for path in &written {
                    info!("Wrote {}", path.display());
                }
            }
            Err(e) => warn!("Artifact generation failed: {}", e),
        }
    }

    if let Some(stats) = outcome? {
        info!(
            "Session totals: {} stored, {} applied, {} ignored, {} dropped",
            stats.stored, stats.applied, stats.ignored, stats.dropped
        );
    }

    Ok(())
}

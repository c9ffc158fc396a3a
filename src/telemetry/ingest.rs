//! # Telemetry Ingest Module
//!
//! Turns classified serial lines into state changes and stored packets.
//!
//! [`ingest`] handles a single line: a settings line updates the live
//! [`LinkSettings`], a packet line is stamped with the current time and
//! settings snapshot and appended to the packet log, anything else is
//! ignored. [`run`] wraps that in the long-lived read loop with a periodic
//! status report.
//!
//! A packet line that arrives before any settings line is stored with the
//! default radio parameters and distance 0.0; the reader of the log has no
//! better information to offer.

use std::path::Path;
use std::time::Duration;

use chrono::Local;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::error::{MonitorError, Result};
use crate::serial::LineSource;
use crate::settings::{LinkSettings, RadioParams};
use crate::store;
use crate::telemetry::packet::{Packet, DATETIME_FORMAT};
use crate::telemetry::parser::{classify, LineRecord};

/// What [`ingest`] did with one line.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The line was a settings report; the new parameters are now live.
    SettingsApplied(RadioParams),
    /// The line was a packet report; the stored record is returned.
    PacketStored(Packet),
    /// The line matched neither grammar and was dropped.
    Ignored,
}

/// Counters accumulated by one [`run`] session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Packet lines stored in the log.
    pub stored: u64,
    /// Settings lines applied.
    pub applied: u64,
    /// Lines matching neither grammar.
    pub ignored: u64,
    /// Packet lines lost to storage failures.
    pub dropped: u64,
}

/// Process one line from the telemetry link.
///
/// # Errors
///
/// Returns [`MonitorError::Storage`] only when a packet line failed to
/// reach the log. Settings and unrecognized lines never fail.
pub fn ingest(line: &str, settings: &mut LinkSettings, log_path: &Path) -> Result<IngestOutcome> {
    match classify(line) {
        LineRecord::Settings(params) => {
            settings.apply_settings(params);
            info!(
                "settings updated: sf={} tx={} bw={}",
                params.sf, params.tx, params.bw
            );
            Ok(IngestOutcome::SettingsApplied(params))
        }
        LineRecord::Packet {
            rssi,
            snr,
            bit_errors,
        } => {
            let packet = Packet {
                datetime: Local::now().format(DATETIME_FORMAT).to_string(),
                distance: settings.current_distance.unwrap_or(0.0),
                bit_errors,
                snr,
                rssi,
                sf: settings.sf,
                tx: settings.tx,
                bw: settings.bw,
                latitude: settings.latitude,
                longitude: settings.longitude,
            };
            store::append(log_path, &packet)?;
            info!(
                "packet stored: rssi={} snr={} bit_errors={} distance={}",
                packet.rssi, packet.snr, packet.bit_errors, packet.distance
            );
            Ok(IngestOutcome::PacketStored(packet))
        }
        LineRecord::Unrecognized => {
            debug!("ignoring unrecognized line: {:?}", line);
            Ok(IngestOutcome::Ignored)
        }
    }
}

/// Read lines from `source` until it is exhausted or the link drops.
///
/// Empty lines are skipped without counting. A storage failure drops the
/// one sample and keeps the loop alive; a read failure ends the session.
/// Every `status_interval` the running counters are logged.
///
/// # Errors
///
/// Returns [`MonitorError::Serial`] when the source reports a read error.
pub async fn run<S>(
    source: &mut S,
    settings: &mut LinkSettings,
    log_path: &Path,
    status_interval: Duration,
) -> Result<RunStats>
where
    S: LineSource + ?Sized,
{
    let mut stats = RunStats::default();

    let mut status = tokio::time::interval(status_interval);
    status.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the first status
    // report lands a full interval in.
    status.tick().await;

    loop {
        tokio::select! {
            line = source.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("telemetry source closed");
                        return Ok(stats);
                    }
                    Err(e) => {
                        error!("serial connection lost: {}", e);
                        return Err(MonitorError::Serial(e.to_string()));
                    }
                };
                if line.is_empty() {
                    continue;
                }
                match ingest(&line, settings, log_path) {
                    Ok(IngestOutcome::PacketStored(_)) => stats.stored += 1,
                    Ok(IngestOutcome::SettingsApplied(_)) => stats.applied += 1,
                    Ok(IngestOutcome::Ignored) => stats.ignored += 1,
                    Err(e) => {
                        error!("dropping packet, log write failed: {}", e);
                        stats.dropped += 1;
                    }
                }
            }
            _ = status.tick() => {
                info!(
                    "link status: {} stored, {} applied, {} ignored, {} dropped",
                    stats.stored, stats.applied, stats.ignored, stats.dropped
                );
            }
        }
    }
}

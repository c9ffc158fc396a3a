//! # Analysis Module
//!
//! Post-processing of the packet log into plot-ready artifacts.
//!
//! This module handles:
//! - Bandwidth-grouped distance-interval averaging of SNR and RSSI
//! - Writing the reduced series as timestamped JSON artifacts
//! - Writing a Leaflet map of recorded GPS fixes

pub mod binning;
pub mod map;
pub mod series;

pub use binning::{reduce, BandwidthSeries, Metric, SeriesPoint};

use std::path::{Path, PathBuf};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::telemetry::Packet;

/// Write the full artifact set for `packets`: both metric series and, when
/// any packet carries coordinates, the fix map. Returns the written paths.
///
/// # Errors
///
/// Returns [`crate::error::MonitorError::Storage`] when the artifact
/// directory cannot be written.
pub fn write_artifacts(packets: &[Packet], config: &AnalysisConfig) -> Result<Vec<PathBuf>> {
    let dir = Path::new(&config.artifacts_dir);
    let mut written = Vec::new();

    written.push(series::write_series(
        packets,
        Metric::Snr,
        config.bin_width_m,
        dir,
    )?);
    written.push(series::write_series(
        packets,
        Metric::Rssi,
        config.bin_width_m,
        dir,
    )?);
    if let Some(map_path) = map::write_map(packets, dir)? {
        written.push(map_path);
    }

    Ok(written)
}

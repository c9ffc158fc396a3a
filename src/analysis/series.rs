//! Plot-ready series artifacts derived from the packet log.
//!
//! Image rendering lives outside this crate; what gets written here is the
//! reduced data a plotting front end consumes, one timestamped JSON file
//! per metric.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::analysis::binning::{reduce, BandwidthSeries, Metric};
use crate::error::{MonitorError, Result};
use crate::telemetry::Packet;

/// Payload of one series artifact file.
#[derive(Debug, Serialize)]
struct SeriesArtifact<'a> {
    metric: &'static str,
    bin_width_m: f64,
    series: &'a [BandwidthSeries],
}

/// Reduce `packets` and write the result as a timestamped JSON artifact.
///
/// The file lands in `dir` (created as needed) under
/// `{metric}_vs_distance_averaged_{YYYYmmdd_HHMMSS}.json`. A log with no
/// usable samples still produces a file, with an empty series list.
///
/// # Errors
///
/// Returns [`MonitorError::Storage`] when the directory or file cannot be
/// written.
pub fn write_series(
    packets: &[Packet],
    metric: Metric,
    bin_width: f64,
    dir: &Path,
) -> Result<PathBuf> {
    let series = reduce(packets, metric, bin_width);

    fs::create_dir_all(dir).map_err(|e| {
        MonitorError::Storage(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!(
        "{}_vs_distance_averaged_{}.json",
        metric.name(),
        timestamp
    ));

    let artifact = SeriesArtifact {
        metric: metric.name(),
        bin_width_m: bin_width,
        series: &series,
    };
    let json = serde_json::to_string_pretty(&artifact)
        .map_err(|e| MonitorError::Storage(format!("Failed to serialize series: {}", e)))?;
    fs::write(&path, json).map_err(|e| {
        MonitorError::Storage(format!("Failed to write {}: {}", path.display(), e))
    })?;

    info!("wrote {} series artifact: {}", metric.name(), path.display());
    Ok(path)
}

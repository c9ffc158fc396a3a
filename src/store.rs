//! # Packet Store Module
//!
//! Append-only JSON packet log on disk.
//!
//! This module handles:
//! - Tolerant loading: a missing or unparseable log reads as empty
//! - Appending one packet via a whole-file rewrite (temp file + rename)
//! - Creating fresh empty logs and listing the ones in the log directory
//! - A startup write-probe that surfaces permission problems early
//!
//! The whole-file rewrite is deliberately simple: packet rates are
//! telemetry-scale (a few per second at most), so there is no incremental
//! index. The rename keeps a concurrent `load` from ever seeing a torn
//! file, but two writers appending at once can still lose one record to the
//! read-modify-write race; the host keeps a single writer.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::telemetry::Packet;

/// Load the packet log at `path`.
///
/// Never fails: a missing file, unreadable file, non-JSON content, a
/// non-array top level, or records that are not packet-shaped all yield an
/// empty vector. This is the designed fallback, not an error path.
#[must_use]
pub fn load<P: AsRef<Path>>(path: P) -> Vec<Packet> {
    let path = path.as_ref();

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!("packet log {} not readable ({}), treating as empty", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str(&text) {
        Ok(packets) => packets,
        Err(e) => {
            debug!("packet log {} not packet-shaped ({}), treating as empty", path.display(), e);
            Vec::new()
        }
    }
}

/// Append one packet to the log at `path`.
///
/// Loads the current sequence with the same tolerant rule as [`load`],
/// pushes the packet, and rewrites the whole file through a sibling temp
/// file so a concurrent [`load`] sees either the old or the new array.
///
/// # Errors
///
/// Returns [`MonitorError::Storage`] if the destination cannot be written
/// (permissions, disk full). The caller decides whether to surface or drop
/// the sample; no retry is performed here.
pub fn append<P: AsRef<Path>>(path: P, packet: &Packet) -> Result<()> {
    let path = path.as_ref();
    let mut packets = load(path);
    packets.push(packet.clone());
    write_atomic(path, &packets)
}

/// Create a new empty log at `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`MonitorError::Storage`] on write failure.
pub fn create_empty<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                MonitorError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
    }

    write_atomic(path, &[])
}

/// List the `.json` packet logs in `dir`, sorted by file name.
///
/// A missing or unreadable directory lists as empty, mirroring the
/// tolerant [`load`] contract.
#[must_use]
pub fn list_logs<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir.as_ref()) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut logs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    logs.sort();
    logs
}

/// Verify that `dir` exists and is writable by writing and removing a
/// scratch file.
///
/// # Errors
///
/// Returns [`MonitorError::Storage`] when the directory cannot be created
/// or written; callers typically downgrade this to a warning at startup.
pub fn probe_writable<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();

    fs::create_dir_all(dir).map_err(|e| {
        MonitorError::Storage(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let probe = dir.join("test_write.tmp");
    fs::write(&probe, b"test").map_err(|e| {
        MonitorError::Storage(format!("{} is not writable: {}", dir.display(), e))
    })?;
    fs::remove_file(&probe).map_err(|e| {
        MonitorError::Storage(format!("Failed to remove {}: {}", probe.display(), e))
    })?;

    Ok(())
}

/// Serialize `packets` and move the result over `path` in one rename.
fn write_atomic(path: &Path, packets: &[Packet]) -> Result<()> {
    let json = serde_json::to_string_pretty(packets)
        .map_err(|e| MonitorError::Storage(format!("Failed to serialize packet log: {}", e)))?;

    let scratch = scratch_path(path);
    fs::write(&scratch, json).map_err(|e| {
        MonitorError::Storage(format!("Failed to write {}: {}", scratch.display(), e))
    })?;
    fs::rename(&scratch, path).map_err(|e| {
        let _ = fs::remove_file(&scratch);
        MonitorError::Storage(format!("Failed to replace {}: {}", path.display(), e))
    })?;

    Ok(())
}

/// Sibling temp path for the atomic rewrite, `<name>.tmp` in the same
/// directory so the rename never crosses filesystems.
fn scratch_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "packets".into());
    name.push(".tmp");
    path.with_file_name(name)
}

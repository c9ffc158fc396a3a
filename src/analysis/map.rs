//! Leaflet map of recorded GPS fixes.
//!
//! Writes a self-contained `map.html` with one marker per packet that
//! carries both coordinates. The page pulls Leaflet and the OpenStreetMap
//! tiles from their public CDNs; there is no server side.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{MonitorError, Result};
use crate::telemetry::Packet;

/// Fixed output name; a new export overwrites the previous map.
pub const MAP_FILE_NAME: &str = "map.html";

/// Initial zoom level, sized for a field-test range of a few kilometers.
const MAP_ZOOM: u32 = 13;

const POPUP_MAX_WIDTH: u32 = 300;

/// Write the fix map into `dir`, centered on the first packet with
/// coordinates.
///
/// Returns `Ok(None)` without touching the filesystem when no packet has
/// a complete fix.
///
/// # Errors
///
/// Returns [`MonitorError::Storage`] when the directory or file cannot be
/// written.
pub fn write_map(packets: &[Packet], dir: &Path) -> Result<Option<PathBuf>> {
    let with_fix: Vec<&Packet> = packets.iter().filter(|p| p.has_fix()).collect();
    let Some(first) = with_fix.first() else {
        info!("no packets carry coordinates, skipping map");
        return Ok(None);
    };

    fs::create_dir_all(dir).map_err(|e| {
        MonitorError::Storage(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let mut markers = String::new();
    for packet in &with_fix {
        markers.push_str(&marker_js(packet));
    }

    let html = page_html(
        first.latitude.unwrap_or_default(),
        first.longitude.unwrap_or_default(),
        &markers,
    );

    let path = dir.join(MAP_FILE_NAME);
    fs::write(&path, html).map_err(|e| {
        MonitorError::Storage(format!("Failed to write {}: {}", path.display(), e))
    })?;

    info!("wrote fix map: {} ({} markers)", path.display(), with_fix.len());
    Ok(Some(path))
}

fn marker_js(packet: &Packet) -> String {
    let lat = packet.latitude.unwrap_or_default();
    let lon = packet.longitude.unwrap_or_default();
    // The channel path stores datetime verbatim; keep it JS-string safe.
    let datetime = packet.datetime.replace('\\', "\\\\").replace('"', "\\\"");

    let popup = format!(
        "<b>Time:</b> {}<br>\
         <b>Distance:</b> {:.2} m<br>\
         <b>RSSI:</b> {:?}<br>\
         <b>SNR:</b> {:?}<br>\
         <b>Bit errors:</b> {}<br>\
         <b>SF:</b> {}<br>\
         <b>Tx:</b> {}<br>\
         <b>BW:</b> {:?}",
        datetime,
        packet.distance,
        packet.rssi,
        packet.snr,
        packet.bit_errors,
        packet.sf,
        packet.tx,
        packet.bw,
    );

    format!(
        "L.marker([{}, {}]).addTo(map)\n    .bindPopup(\"{}\", {{maxWidth: {}}})\n    .bindTooltip(\"Distance: {:.2} m\");\n",
        lat, lon, popup, POPUP_MAX_WIDTH, packet.distance,
    )
}

fn page_html(lat: f64, lon: f64, markers: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>LoRa link fixes</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView([{lat}, {lon}], {MAP_ZOOM});
L.tileLayer("https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
    maxZoom: 19,
    attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
{markers}</script>
</body>
</html>
"#
    )
}

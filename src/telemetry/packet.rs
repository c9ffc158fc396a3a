//! # Packet Model
//!
//! One received telemetry sample as persisted in the packet log.

use serde::{Deserialize, Serialize};

/// Timestamp format used for the `datetime` field (second precision).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One telemetry sample.
///
/// Field declaration order is the serialized order of the packet log, so it
/// must stay `datetime, distance, bit_errors, snr, rssi, sf, tx, bw` with
/// the optional GPS fix last. Records are immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Local wall-clock time of reception, `%Y-%m-%d %H:%M:%S`
    pub datetime: String,

    /// Distance to the transmitter in meters (0.0 when never reported)
    pub distance: f64,

    /// Bit errors detected in the payload
    pub bit_errors: u32,

    /// Signal-to-noise ratio in dB
    pub snr: f64,

    /// Received signal strength in dBm
    pub rssi: f64,

    /// Spreading factor active when the packet arrived
    pub sf: u8,

    /// Transmit power in dBm active when the packet arrived
    pub tx: u8,

    /// Bandwidth in kHz active when the packet arrived
    pub bw: f64,

    /// Latitude of the transmitter fix, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Longitude of the transmitter fix, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Packet {
    /// Whether this packet carries a complete GPS fix.
    #[must_use]
    pub fn has_fix(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Packet {
        Packet {
            datetime: "2024-05-01 12:00:00".to_string(),
            distance: 150.0,
            bit_errors: 2,
            snr: 6.25,
            rssi: -97.0,
            sf: 12,
            tx: 17,
            bw: 125.0,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_serialized_field_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        let datetime_pos = json.find("datetime").unwrap();
        let distance_pos = json.find("distance").unwrap();
        let errors_pos = json.find("bit_errors").unwrap();
        let snr_pos = json.find("\"snr\"").unwrap();
        let rssi_pos = json.find("\"rssi\"").unwrap();
        let bw_pos = json.find("\"bw\"").unwrap();

        assert!(datetime_pos < distance_pos);
        assert!(distance_pos < errors_pos);
        assert!(errors_pos < snr_pos);
        assert!(snr_pos < rssi_pos);
        assert!(rssi_pos < bw_pos);
    }

    #[test]
    fn test_gps_fields_skipped_when_absent() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("latitude"));
        assert!(!json.contains("longitude"));
    }

    #[test]
    fn test_gps_fields_serialized_when_present() {
        let mut packet = sample();
        packet.latitude = Some(55.7558);
        packet.longitude = Some(37.6173);

        let json = serde_json::to_string(&packet).unwrap();
        assert!(json.contains("\"latitude\":55.7558"));
        assert!(json.contains("\"longitude\":37.6173"));
    }

    #[test]
    fn test_deserialize_without_gps_fields() {
        let json = r#"{
            "datetime": "2024-05-01 12:00:00",
            "distance": 10.5,
            "bit_errors": 0,
            "snr": 9.5,
            "rssi": -80.0,
            "sf": 7,
            "tx": 14,
            "bw": 250.0
        }"#;

        let packet: Packet = serde_json::from_str(json).unwrap();
        assert_eq!(packet.sf, 7);
        assert_eq!(packet.latitude, None);
        assert!(!packet.has_fix());
    }

    #[test]
    fn test_has_fix_requires_both_coordinates() {
        let mut packet = sample();
        packet.latitude = Some(55.0);
        assert!(!packet.has_fix());
        packet.longitude = Some(37.0);
        assert!(packet.has_fix());
    }
}

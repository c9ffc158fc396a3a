//! # Channel Dispatch Module
//!
//! Ingest path for structured messages arriving over the network event
//! channel, as opposed to the raw serial line.
//!
//! A [`ChannelMessage`] is a loose bag of optional fields: it may carry a
//! settings update, a position update, a complete packet sample, or any
//! combination. [`dispatch`] routes each part in a fixed order and returns
//! what happened, including the settings acknowledgment the channel
//! collaborator sends back to the operator. The transport itself (connect,
//! reconnect, registration) lives outside this crate.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::device::ConfigPush;
use crate::error::Result;
use crate::settings::{LinkSettings, RadioParams};
use crate::store;
use crate::telemetry::Packet;

/// One message from the network channel. Every field is optional; absent
/// fields mean "no update".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMessage {
    /// New radio parameters to apply locally and push to the device.
    pub settings: Option<RadioParams>,
    /// Measured distance to the transmitter, meters.
    pub distance: Option<f64>,
    /// Transmitter latitude, decimal degrees.
    pub latitude: Option<f64>,
    /// Transmitter longitude, decimal degrees.
    pub longitude: Option<f64>,
    /// Sample timestamp, already formatted by the sender.
    pub datetime: Option<String>,
    /// Corrupted bits in the sample.
    pub bit_errors: Option<u32>,
    /// Signal-to-noise ratio, dB.
    pub snr: Option<f64>,
    /// Received signal strength, dBm.
    pub rssi: Option<f64>,
}

impl ChannelMessage {
    /// Parse the wire text form.
    ///
    /// Unknown fields are ignored; missing fields default to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MonitorError::Channel`] when `text` is not
    /// valid JSON of the expected shape.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// True when the message carries every field of a packet sample.
    #[must_use]
    pub fn has_packet_fields(&self) -> bool {
        self.datetime.is_some()
            && self.distance.is_some()
            && self.bit_errors.is_some()
            && self.snr.is_some()
            && self.rssi.is_some()
    }
}

/// Ack status on the wire: `"success"` or `"error"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
    Error,
}

/// Acknowledgment sent back after a settings update, whatever the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsAck {
    pub status: AckStatus,
    pub message: String,
}

impl SettingsAck {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: AckStatus::Success,
            message: "Settings applied on the device".to_string(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Error,
            message: message.into(),
        }
    }
}

/// What [`dispatch`] did with one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
    /// Ack to emit when the message carried settings.
    pub ack: Option<SettingsAck>,
    /// Packet appended to the log when the message carried a full sample.
    pub stored: Option<Packet>,
    /// Whether distance or coordinates changed.
    pub position_updated: bool,
}

/// Route one channel message.
///
/// Order matters: settings first, then position, then the packet append,
/// so a sample in the same message is stamped with the state it arrived
/// with. A device push failure is folded into the error ack, not returned;
/// the local settings keep the new values either way.
///
/// # Errors
///
/// Returns [`crate::error::MonitorError::Storage`] only when a carried
/// packet could not be appended to the log.
pub async fn dispatch<C>(
    message: &ChannelMessage,
    settings: &mut LinkSettings,
    log_path: &Path,
    device: &C,
) -> Result<DispatchOutcome>
where
    C: ConfigPush + ?Sized,
{
    let mut outcome = DispatchOutcome::default();

    if let Some(params) = message.settings {
        settings.apply_settings(params);
        info!(
            "channel settings update: sf={} tx={} bw={}",
            params.sf, params.tx, params.bw
        );

        outcome.ack = Some(match device.push(params).await {
            Ok(()) => SettingsAck::success(),
            Err(e) => {
                warn!("settings not delivered to device: {}", e);
                SettingsAck::error(e.to_string())
            }
        });
    }

    if message.distance.is_some() || message.latitude.is_some() || message.longitude.is_some() {
        settings.apply_position(message.distance, message.latitude, message.longitude);
        outcome.position_updated = true;
    }

    if message.has_packet_fields() {
        // has_packet_fields() checked every field above.
        let packet = Packet {
            datetime: message.datetime.clone().unwrap_or_default(),
            distance: message.distance.unwrap_or_default(),
            bit_errors: message.bit_errors.unwrap_or_default(),
            snr: message.snr.unwrap_or_default(),
            rssi: message.rssi.unwrap_or_default(),
            sf: settings.sf,
            tx: settings.tx,
            bw: settings.bw,
            latitude: settings.latitude,
            longitude: settings.longitude,
        };
        store::append(log_path, &packet)?;
        info!(
            "channel packet stored: rssi={} snr={} bit_errors={}",
            packet.rssi, packet.snr, packet.bit_errors
        );
        outcome.stored = Some(packet);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mocks::MockConfigPush;
    use crate::error::MonitorError;
    use std::fs;
    use tempfile::tempdir;

    fn full_sample_json() -> &'static str {
        r#"{
            "datetime": "2024-05-01 12:00:00",
            "distance": 250.0,
            "bit_errors": 3,
            "snr": 5.25,
            "rssi": -104.0
        }"#
    }

    #[test]
    fn test_from_json_with_all_fields_absent() {
        let message = ChannelMessage::from_json("{}").unwrap();
        assert_eq!(message, ChannelMessage::default());
        assert!(!message.has_packet_fields());
    }

    #[test]
    fn test_from_json_ignores_unknown_fields() {
        let message =
            ChannelMessage::from_json(r#"{"distance": 10.0, "source": "relay-2"}"#).unwrap();
        assert_eq!(message.distance, Some(10.0));
    }

    #[test]
    fn test_from_json_rejects_non_json() {
        let result = ChannelMessage::from_json("not json at all");
        assert!(matches!(result, Err(MonitorError::Channel(_))));
    }

    #[test]
    fn test_settings_ack_wire_form() {
        let ok = serde_json::to_string(&SettingsAck::success()).unwrap();
        assert!(ok.contains(r#""status":"success""#));

        let err = serde_json::to_string(&SettingsAck::error("no route to device")).unwrap();
        assert!(err.contains(r#""status":"error""#));
        assert!(err.contains("no route to device"));
    }

    #[tokio::test]
    async fn test_settings_message_pushes_and_acks_success() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("packets_info.json");
        let mut settings = LinkSettings::default();
        let device = MockConfigPush::new();

        let message =
            ChannelMessage::from_json(r#"{"settings": {"sf": 9, "tx": 14, "bw": 250.0}}"#)
                .unwrap();
        let outcome = dispatch(&message, &mut settings, &log, &device)
            .await
            .unwrap();

        assert_eq!(settings.sf, 9);
        assert_eq!(settings.tx, 14);
        assert_eq!(settings.bw, 250.0);
        assert_eq!(device.get_pushed().len(), 1);
        assert_eq!(outcome.ack, Some(SettingsAck::success()));
        assert!(outcome.stored.is_none());
    }

    #[tokio::test]
    async fn test_device_failure_becomes_error_ack_not_err() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("packets_info.json");
        let mut settings = LinkSettings::default();
        let device = MockConfigPush::new();
        device.set_push_error("AP not reachable");

        let message =
            ChannelMessage::from_json(r#"{"settings": {"sf": 9, "tx": 14, "bw": 250.0}}"#)
                .unwrap();
        let outcome = dispatch(&message, &mut settings, &log, &device)
            .await
            .unwrap();

        // Local state keeps the new values even when the device is away.
        assert_eq!(settings.sf, 9);
        let ack = outcome.ack.unwrap();
        assert_eq!(ack.status, AckStatus::Error);
        assert!(ack.message.contains("AP not reachable"));
    }

    #[tokio::test]
    async fn test_settings_update_keeps_known_position() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("packets_info.json");
        let mut settings = LinkSettings::default();
        settings.apply_position(Some(120.0), Some(55.75), None);
        let device = MockConfigPush::new();

        let message =
            ChannelMessage::from_json(r#"{"settings": {"sf": 7, "tx": 10, "bw": 500.0}}"#)
                .unwrap();
        dispatch(&message, &mut settings, &log, &device)
            .await
            .unwrap();

        assert_eq!(settings.current_distance, Some(120.0));
        assert_eq!(settings.latitude, Some(55.75));
    }

    #[tokio::test]
    async fn test_position_only_message_updates_settings() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("packets_info.json");
        let mut settings = LinkSettings::default();
        let device = MockConfigPush::new();

        let message =
            ChannelMessage::from_json(r#"{"distance": 440.0, "latitude": 55.7, "longitude": 37.6}"#)
                .unwrap();
        let outcome = dispatch(&message, &mut settings, &log, &device)
            .await
            .unwrap();

        assert!(outcome.position_updated);
        assert!(outcome.ack.is_none());
        assert_eq!(settings.current_distance, Some(440.0));
        assert_eq!(settings.latitude, Some(55.7));
        assert_eq!(settings.longitude, Some(37.6));
        assert!(!log.exists());
    }

    #[tokio::test]
    async fn test_full_sample_is_stored_with_current_radio_state() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("packets_info.json");
        let mut settings = LinkSettings::default();
        let device = MockConfigPush::new();

        let message = ChannelMessage::from_json(full_sample_json()).unwrap();
        let outcome = dispatch(&message, &mut settings, &log, &device)
            .await
            .unwrap();

        let stored = outcome.stored.unwrap();
        assert_eq!(stored.datetime, "2024-05-01 12:00:00");
        assert_eq!(stored.distance, 250.0);
        assert_eq!(stored.sf, 12);
        assert_eq!(stored.tx, 17);
        assert_eq!(stored.bw, 125.0);

        let packets = store::load(&log);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0], stored);
        // The sample's own distance also became the current position.
        assert_eq!(settings.current_distance, Some(250.0));
    }

    #[tokio::test]
    async fn test_combined_message_applies_settings_before_store() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("packets_info.json");
        let mut settings = LinkSettings::default();
        let device = MockConfigPush::new();

        let message = ChannelMessage::from_json(
            r#"{
                "settings": {"sf": 8, "tx": 12, "bw": 500.0},
                "datetime": "2024-05-01 12:00:00",
                "distance": 250.0,
                "bit_errors": 0,
                "snr": 9.5,
                "rssi": -88.0,
                "latitude": 55.7,
                "longitude": 37.6
            }"#,
        )
        .unwrap();
        let outcome = dispatch(&message, &mut settings, &log, &device)
            .await
            .unwrap();

        let stored = outcome.stored.unwrap();
        assert_eq!(stored.sf, 8);
        assert_eq!(stored.bw, 500.0);
        assert_eq!(stored.latitude, Some(55.7));
        assert_eq!(stored.longitude, Some(37.6));
        assert!(outcome.position_updated);
        assert_eq!(outcome.ack, Some(SettingsAck::success()));
    }

    #[tokio::test]
    async fn test_partial_packet_fields_store_nothing() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("packets_info.json");
        let mut settings = LinkSettings::default();
        let device = MockConfigPush::new();

        // rssi missing: not a complete sample, but distance still applies.
        let message = ChannelMessage::from_json(
            r#"{"datetime": "2024-05-01 12:00:00", "distance": 250.0, "bit_errors": 3, "snr": 5.25}"#,
        )
        .unwrap();
        let outcome = dispatch(&message, &mut settings, &log, &device)
            .await
            .unwrap();

        assert!(outcome.stored.is_none());
        assert!(outcome.position_updated);
        assert!(!log.exists());
    }

    #[tokio::test]
    async fn test_storage_failure_is_the_only_err() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let log = blocker.join("packets_info.json");
        let mut settings = LinkSettings::default();
        let device = MockConfigPush::new();

        let message = ChannelMessage::from_json(full_sample_json()).unwrap();
        let result = dispatch(&message, &mut settings, &log, &device).await;

        assert!(matches!(result, Err(MonitorError::Storage(_))));
        // Position still applied before the append was attempted.
        assert_eq!(settings.current_distance, Some(250.0));
    }
}

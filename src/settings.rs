//! # Link Settings State
//!
//! Last-known radio configuration and derived position of the link under
//! test. One instance is owned by the ingest driver and passed by mutable
//! reference into every ingest/dispatch call, so unit tests get a fresh
//! state per call sequence instead of process-wide globals.

/// Radio configuration triple as carried by settings updates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RadioParams {
    /// Spreading factor (LoRa SF7..SF12)
    pub sf: u8,

    /// Transmit power in dBm
    pub tx: u8,

    /// Channel bandwidth in kHz
    pub bw: f64,
}

/// Current link state: radio configuration plus last-known derived values.
///
/// The radio triple starts at the receiver's power-on defaults and follows
/// `SettingsUpdated` records from the serial line or `settings` objects from
/// the network channel. Distance and GPS fixes stay `None` until the channel
/// delivers them; every stored packet is stamped with the snapshot current
/// at ingest time.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSettings {
    /// Spreading factor
    pub sf: u8,

    /// Transmit power in dBm
    pub tx: u8,

    /// Bandwidth in kHz
    pub bw: f64,

    /// Last reported distance to the transmitter in meters
    pub current_distance: Option<f64>,

    /// Last reported latitude in degrees
    pub latitude: Option<f64>,

    /// Last reported longitude in degrees
    pub longitude: Option<f64>,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            sf: 12,
            tx: 17,
            bw: 125.0,
            current_distance: None,
            latitude: None,
            longitude: None,
        }
    }
}

impl LinkSettings {
    /// Overwrite the radio triple. Distance and position are untouched.
    pub fn apply_settings(&mut self, params: RadioParams) {
        self.sf = params.sf;
        self.tx = params.tx;
        self.bw = params.bw;
    }

    /// Overwrite only the fields present in a position update; `None`
    /// leaves the previous value in place.
    pub fn apply_position(
        &mut self,
        distance: Option<f64>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) {
        if let Some(d) = distance {
            self.current_distance = Some(d);
        }
        if let Some(lat) = latitude {
            self.latitude = Some(lat);
        }
        if let Some(lon) = longitude {
            self.longitude = Some(lon);
        }
    }

    /// Current radio triple as a [`RadioParams`] value.
    #[must_use]
    pub fn radio(&self) -> RadioParams {
        RadioParams {
            sf: self.sf,
            tx: self.tx,
            bw: self.bw,
        }
    }
}

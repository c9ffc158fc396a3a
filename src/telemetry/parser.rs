//! # Serial Line Classifier
//!
//! Classifies raw lines from the LoRa receiver against the two record
//! shapes the firmware prints:
//!
//! ```text
//! SettingsUpdated{ SF: 7 TX: 14 BW: 125.0 }
//! PacketInfo{ Rssi: -97 Snr: 6.25 Bit errors: 3 }
//! ```
//!
//! Matching is anchored at the start of the line; anything after the
//! closing `}` is ignored. Whitespace between tokens is flexible (zero or
//! more), but the literal tokens themselves are fixed; `Bit errors:`
//! carries exactly one space. Number shapes are strict: `SF`/`TX` and
//! `Bit errors` are unsigned integers, `Rssi` is an integer with an
//! optional `-`, and `Snr`/`BW` require digits on both sides of the
//! decimal point.
//!
//! A line that matches neither shape is a normal, silent outcome: the
//! receiver also prints boot banners and debug text on the same port.

use crate::settings::RadioParams;

/// A classified serial line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineRecord {
    /// The receiver confirmed a radio reconfiguration.
    Settings(RadioParams),

    /// The receiver reported a received packet's signal quality.
    Packet {
        /// Received signal strength in dBm
        rssi: f64,
        /// Signal-to-noise ratio in dB
        snr: f64,
        /// Bit errors detected in the payload
        bit_errors: u32,
    },

    /// Neither record shape matched; nothing to do.
    Unrecognized,
}

/// Classify one line from the serial port.
///
/// The settings shape is tried first; the grammars share no prefix, so a
/// line can only ever match one of them. Never fails and never mutates
/// anything; malformed input is [`LineRecord::Unrecognized`].
///
/// # Examples
///
/// ```
/// use lora_monitor::telemetry::parser::{classify, LineRecord};
///
/// match classify("PacketInfo{ Rssi: -97 Snr: 6.25 Bit errors: 3 }") {
///     LineRecord::Packet { rssi, .. } => assert_eq!(rssi, -97.0),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[must_use]
pub fn classify(line: &str) -> LineRecord {
    if let Some(record) = try_settings(line) {
        return record;
    }
    if let Some(record) = try_packet(line) {
        return record;
    }
    LineRecord::Unrecognized
}

fn try_settings(line: &str) -> Option<LineRecord> {
    let mut cur = Cursor::new(line);
    cur.literal("SettingsUpdated{")?;
    cur.skip_ws();
    cur.literal("SF:")?;
    cur.skip_ws();
    let sf: u8 = cur.uint()?;
    cur.skip_ws();
    cur.literal("TX:")?;
    cur.skip_ws();
    let tx: u8 = cur.uint()?;
    cur.skip_ws();
    cur.literal("BW:")?;
    cur.skip_ws();
    let bw = cur.decimal(Sign::None)?;
    cur.skip_ws();
    cur.literal("}")?;
    Some(LineRecord::Settings(RadioParams { sf, tx, bw }))
}

fn try_packet(line: &str) -> Option<LineRecord> {
    let mut cur = Cursor::new(line);
    cur.literal("PacketInfo{")?;
    cur.skip_ws();
    cur.literal("Rssi:")?;
    cur.skip_ws();
    let rssi = cur.integer(Sign::Minus)?;
    cur.skip_ws();
    cur.literal("Snr:")?;
    cur.skip_ws();
    let snr = cur.decimal(Sign::Minus)?;
    cur.skip_ws();
    cur.literal("Bit errors:")?;
    cur.skip_ws();
    let bit_errors: u32 = cur.uint()?;
    cur.skip_ws();
    cur.literal("}")?;
    Some(LineRecord::Packet {
        rssi,
        snr,
        bit_errors,
    })
}

/// Whether a numeric token may carry a leading minus.
#[derive(Clone, Copy, PartialEq)]
enum Sign {
    None,
    Minus,
}

/// Cursor over the unconsumed tail of the line.
///
/// Every matcher either consumes its token and returns `Some`, or returns
/// `None` with the cursor state unspecified. Callers abandon the whole
/// attempt on the first `None`, so no backtracking is needed.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    /// Consume an exact token.
    fn literal(&mut self, token: &str) -> Option<()> {
        self.rest = self.rest.strip_prefix(token)?;
        Some(())
    }

    /// Consume any run of whitespace, including none.
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// Length of the leading ASCII digit run.
    fn digit_run(s: &str) -> usize {
        s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len())
    }

    /// Consume an unsigned integer token.
    fn uint<T: std::str::FromStr>(&mut self) -> Option<T> {
        let len = Self::digit_run(self.rest);
        if len == 0 {
            return None;
        }
        let (token, rest) = self.rest.split_at(len);
        self.rest = rest;
        token.parse().ok()
    }

    /// Consume an integer token with no fractional part.
    fn integer(&mut self, sign: Sign) -> Option<f64> {
        let neg = sign == Sign::Minus && self.rest.starts_with('-');
        let offset = usize::from(neg);
        let len = Self::digit_run(&self.rest[offset..]);
        if len == 0 {
            return None;
        }
        let (token, rest) = self.rest.split_at(offset + len);
        self.rest = rest;
        token.parse().ok()
    }

    /// Consume a decimal token with digits on both sides of the point.
    fn decimal(&mut self, sign: Sign) -> Option<f64> {
        let s = self.rest;
        let mut idx = usize::from(sign == Sign::Minus && s.starts_with('-'));

        let int_len = Self::digit_run(&s[idx..]);
        if int_len == 0 {
            return None;
        }
        idx += int_len;

        if !s[idx..].starts_with('.') {
            return None;
        }
        idx += 1;

        let frac_len = Self::digit_run(&s[idx..]);
        if frac_len == 0 {
            return None;
        }
        idx += frac_len;

        let (token, rest) = s.split_at(idx);
        self.rest = rest;
        token.parse().ok()
    }
}

//! # LoRa Monitor Library
//!
//! Monitor the desktop side of a LoRa telemetry link.
//!
//! This library provides the core functionality for ingesting receiver output
//! from a serial port or a network channel, keeping a JSON packet log, pushing
//! radio settings to the transmitter, and reducing the log into plot-ready
//! artifacts.

pub mod config;
pub mod error;
pub mod settings;
pub mod store;
pub mod telemetry;
pub mod channel;
pub mod device;
pub mod serial;
pub mod analysis;

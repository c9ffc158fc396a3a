//! # Telemetry Module
//!
//! Serial-line telemetry handling for the LoRa link.
//!
//! This module handles:
//! - Classifying raw serial lines against the receiver's two record shapes
//! - Stamping classified packet records with the current link settings
//! - Appending stamped packets to the JSON packet log
//! - Driving the ingest loop over any line source

pub mod ingest;
pub mod packet;
pub mod parser;

pub use ingest::{ingest, IngestOutcome};
pub use packet::Packet;
pub use parser::{classify, LineRecord};

//! # Device Configuration Module
//!
//! Pushes radio parameters to the transmitter's HTTP config endpoint.
//!
//! The transmitter runs a tiny web server on the link's WiFi access point;
//! settings land as a form POST on `/update`. Failures here are expected
//! field conditions (device off, wrong network) and are reported back to
//! the operator through the settings acknowledgment, not retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::DeviceConfig;
use crate::error::{MonitorError, Result};
use crate::settings::RadioParams;

/// Trait for pushing radio parameters to the device, mockable in tests
#[async_trait]
pub trait ConfigPush: Send + Sync {
    /// Apply `params` on the device.
    async fn push(&self, params: RadioParams) -> Result<()>;
}

/// HTTP client for the transmitter's `/update` endpoint.
pub struct DeviceClient {
    client: Client,
    update_url: String,
}

impl DeviceClient {
    /// Build a client for the configured device address.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Device`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| MonitorError::Device(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            update_url: format!("http://{}/update", config.address),
        })
    }

    /// Endpoint this client posts to.
    pub fn update_url(&self) -> &str {
        &self.update_url
    }
}

#[async_trait]
impl ConfigPush for DeviceClient {
    async fn push(&self, params: RadioParams) -> Result<()> {
        // {:?} keeps the decimal point on whole values; the firmware
        // expects the float form for bw (e.g. "125.0", never "125").
        let form = [
            ("sf", params.sf.to_string()),
            ("tx", params.tx.to_string()),
            ("bw", format!("{:?}", params.bw)),
        ];

        debug!("Pushing radio parameters to {}", self.update_url);

        let response = self
            .client
            .post(&self.update_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                MonitorError::Device(format!("Failed to reach {}: {}", self.update_url, e))
            })?;

        if !response.status().is_success() {
            return Err(MonitorError::Device(format!(
                "Device returned {}",
                response.status()
            )));
        }

        info!(
            "Device accepted sf={} tx={} bw={}",
            params.sf, params.tx, params.bw
        );
        Ok(())
    }
}

//! Telemetry push collaborator: sends one accepted reading per cycle to a
//! Domoticz-style endpoint as an HTTP GET with query parameters. Failures
//! are logged; any retry policy belongs to the backend, not the core.

use crate::error::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Endpoint URL, e.g. `http://192.168.1.11:8080/json.htm`.
    pub url: String,
    /// Device index receiving the decimal reading.
    pub idx: String,
    /// Optional second device receiving the reading as a scaled integer
    /// (value × 10^decimal_places).
    #[serde(default)]
    pub counter_idx: Option<String>,
    /// Scale applied for `counter_idx`, in decimal places.
    #[serde(default = "default_counter_scale")]
    pub counter_scale: u32,
}

fn default_counter_scale() -> u32 {
    2
}

pub struct TelemetryClient {
    config: TelemetryConfig,
    client: reqwest::blocking::Client,
}

impl TelemetryClient {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Push one reading. Transport errors propagate so the caller can log
    /// them at error level; there is no retry here.
    pub fn push(&self, value: f64) -> Result<()> {
        self.push_device(&self.config.idx, &format!("{value:.2}"))?;
        if let Some(counter_idx) = &self.config.counter_idx {
            let scaled = (value * 10f64.powi(self.config.counter_scale as i32)).round() as i64;
            if let Err(err) = self.push_device(counter_idx, &scaled.to_string()) {
                // the primary value already went through; don't fail the cycle
                warn!("counter push failed: {err}");
            }
        }
        Ok(())
    }

    fn push_device(&self, idx: &str, svalue: &str) -> Result<()> {
        let response = self
            .client
            .get(&self.config.url)
            .query(&[
                ("type", "command"),
                ("param", "udevice"),
                ("idx", idx),
                ("svalue", svalue),
            ])
            .send()?;
        response.error_for_status()?;
        info!("pushed svalue={svalue} to device {idx}");
        Ok(())
    }
}

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_country() -> String {
    "US".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_scan_interval_secs() -> u64 {
    30
}

/// Configuration for the LG ThinQ integration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Enable the integration (default: true when section is present)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the ThinQ V2 service API
    pub api_base: String,

    /// Pre-issued ThinQ access token
    pub access_token: String,

    /// Client id registered with the access token
    pub client_id: Option<String>,

    /// ISO country code of the account (default: "US")
    #[serde(default = "default_country")]
    pub country: String,

    /// Account language (default: "en-US")
    #[serde(default = "default_language")]
    pub language: String,

    /// Seconds between status polls (default: 30)
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Air conditioners, keyed by the object id used in their entity ids
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceConfig>,
}

/// A single air conditioner
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// ThinQ device id
    pub device_id: String,

    /// Display name
    pub name: String,

    /// Model name, shown in the device registry
    pub model: Option<String>,

    /// Firmware version, shown in the device registry
    pub firmware: Option<String>,

    /// Path to the model info JSON document for this device's model
    pub model_info: PathBuf,
}

impl Config {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    /// Make relative model info paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for device in self.devices.values_mut() {
            if device.model_info.is_relative() {
                device.model_info = base.join(&device.model_info);
            }
        }
    }
}

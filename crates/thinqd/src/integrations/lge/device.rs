use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tokio::sync::MutexGuard;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::DOMAIN;
use crate::engine::DeviceInfo;
use crate::thinq::AirConditionerDevice;
use crate::thinq::AirConditionerStatus;

/// An LG appliance as seen by the platform.
///
/// Holds the vendor device, the latest polled status and whether the last
/// poll reached the device. Entities read through it; only `update` writes.
pub struct LgeDevice {
    name: String,
    unique_id: String,
    device_info: DeviceInfo,
    device: AirConditionerDevice,
    status: ArcSwap<AirConditionerStatus>,
    available: AtomicBool,
    refresh: Mutex<()>,
}

impl LgeDevice {
    pub fn new(
        device: AirConditionerDevice,
        model: Option<String>,
        firmware: Option<String>,
    ) -> Self {
        let descriptor = device.device().descriptor().clone();
        let device_info = DeviceInfo {
            identifiers: vec![(DOMAIN.to_string(), descriptor.device_id.clone())],
            name: descriptor.name.clone(),
            manufacturer: Some("LG".to_string()),
            model: model.or(descriptor.model_name),
            sw_version: firmware,
        };
        let status = ArcSwap::from_pointee(device.empty_status());

        Self {
            name: descriptor.name,
            unique_id: descriptor.device_id,
            device_info,
            device,
            status,
            available: AtomicBool::new(true),
            refresh: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// The vendor device, for issuing commands
    pub fn device(&self) -> &AirConditionerDevice {
        &self.device
    }

    /// Latest polled status (empty until the first successful poll)
    pub fn state(&self) -> Arc<AirConditionerStatus> {
        self.status.load_full()
    }

    /// Exclusive right to refresh this device.
    ///
    /// Held from the poll until the resulting state has been reported, so a
    /// slow poll cannot overwrite or report over a newer one.
    pub async fn refresh_guard(&self) -> MutexGuard<'_, ()> {
        self.refresh.lock().await
    }

    /// Poll the device and record the result.
    ///
    /// A failed poll marks the device unavailable; the last known status is
    /// kept. An empty poll leaves both untouched.
    pub async fn update(&self) {
        match self.device.poll().await {
            Ok(Some(status)) => {
                self.status.store(Arc::new(status));
                if !self.available.swap(true, Ordering::Relaxed) {
                    info!("[{}] Device is available again", self.name);
                }
            }
            Ok(None) => {
                debug!("[{}] Poll returned no data", self.name);
            }
            Err(e) => {
                if self.available.swap(false, Ordering::Relaxed) {
                    warn!("[{}] Device unavailable: {}", self.name, e);
                } else {
                    debug!("[{}] Poll failed again: {}", self.name, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::thinq::Device;
    use crate::thinq::DeviceDescriptor;
    use crate::thinq::MockThinqClient;
    use crate::thinq::ModelInfo;
    use crate::thinq::fixtures;

    fn lge_device(client: &Arc<MockThinqClient>) -> LgeDevice {
        let device = Device::new(
            client.clone(),
            DeviceDescriptor {
                device_id: "ac-1".to_string(),
                name: "Office".to_string(),
                model_name: Some("RAC_056905_WW".to_string()),
            },
            Arc::new(ModelInfo::new(fixtures::v2_model())),
        );
        LgeDevice::new(AirConditionerDevice::new(device), None, Some("1.2.3".to_string()))
    }

    #[test]
    fn test_device_info() {
        let client = Arc::new(MockThinqClient::new());
        let device = lge_device(&client);

        assert_eq!(device.unique_id(), "ac-1");
        assert_eq!(device.name(), "Office");
        let info = device.device_info();
        assert_eq!(info.registry_id(), Some("lge.ac-1".to_string()));
        assert_eq!(info.manufacturer.as_deref(), Some("LG"));
        assert_eq!(info.model.as_deref(), Some("RAC_056905_WW"));
        assert_eq!(info.sw_version.as_deref(), Some("1.2.3"));
    }

    #[tokio::test]
    async fn test_update_tracks_availability() {
        let client = Arc::new(MockThinqClient::new());
        let device = lge_device(&client);
        assert!(device.available());
        assert!(!device.state().has_data());

        client.set_snapshot("ac-1", json!({ "airState.operation": 3 }));
        device.update().await;
        assert!(device.available());
        assert!(device.state().is_on());

        client.set_fail_poll(true);
        device.update().await;
        assert!(!device.available());
        // Last known status survives a failed poll.
        assert!(device.state().is_on());

        client.set_fail_poll(false);
        device.update().await;
        assert!(device.available());
    }
}

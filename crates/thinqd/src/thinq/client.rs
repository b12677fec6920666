use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use super::ThinqError;

/// Device status as returned by the cloud: a flat key -> value object.
pub type Snapshot = Map<String, Value>;

/// A control request for a single device.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Legacy control: a single key/value pair.
    V1 { key: String, value: Value },

    /// `control-sync` request used by V2 devices.
    V2 {
        ctrl_key: String,
        command: String,
        data_key: String,
        data_value: Value,
    },
}

/// Operations the device layer needs from the ThinQ cloud.
///
/// Implemented by the HTTP transport and by a mock in tests.
#[async_trait]
pub trait ThinqClient: Send + Sync {
    /// Send a control command to a device
    async fn control(&self, device_id: &str, command: ControlCommand) -> Result<(), ThinqError>;

    /// Fetch the latest status snapshot of a device
    ///
    /// Returns `Ok(None)` when the cloud has no data for the device yet.
    async fn poll(&self, device_id: &str) -> Result<Option<Snapshot>, ThinqError>;
}

/// Mock ThinQ client for testing
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockThinqClient {
    pub commands: std::sync::Mutex<Vec<(String, ControlCommand)>>,
    pub snapshots: std::sync::Mutex<std::collections::HashMap<String, Snapshot>>,
    pub fail_poll: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
#[async_trait]
impl ThinqClient for MockThinqClient {
    async fn control(&self, device_id: &str, command: ControlCommand) -> Result<(), ThinqError> {
        self.commands
            .lock()
            .unwrap()
            .push((device_id.to_string(), command));
        Ok(())
    }

    async fn poll(&self, device_id: &str) -> Result<Option<Snapshot>, ThinqError> {
        if self.fail_poll.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(ThinqError::Api("mock poll failure".to_string()));
        }
        Ok(self.snapshots.lock().unwrap().get(device_id).cloned())
    }
}

#[cfg(test)]
impl MockThinqClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot returned for `device_id`; `data` must be a JSON object.
    pub fn set_snapshot(&self, device_id: &str, data: Value) {
        let Value::Object(map) = data else {
            panic!("snapshot must be a JSON object");
        };
        self.snapshots
            .lock()
            .unwrap()
            .insert(device_id.to_string(), map);
    }

    pub fn set_fail_poll(&self, fail: bool) {
        self.fail_poll
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Commands sent so far, oldest first
    pub fn sent(&self) -> Vec<(String, ControlCommand)> {
        self.commands.lock().unwrap().clone()
    }
}

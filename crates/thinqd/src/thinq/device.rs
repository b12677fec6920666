use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::ThinqError;
use super::client::ControlCommand;
use super::client::Snapshot;
use super::client::ThinqClient;
use super::model_info::ModelInfo;
use super::model_info::number;

/// A status/control key spelled differently by V1 and V2 models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateKey {
    v1: &'static str,
    v2: &'static str,
}

impl StateKey {
    pub const fn new(v1: &'static str, v2: &'static str) -> Self {
        Self { v1, v2 }
    }

    pub fn resolve(&self, info_v2: bool) -> &'static str {
        if info_v2 { self.v2 } else { self.v1 }
    }
}

/// Identity of a ThinQ device as declared in configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub device_id: String,
    pub name: String,
    pub model_name: Option<String>,
}

/// A ThinQ device: identity, model metadata and the client used to reach it.
pub struct Device {
    client: Arc<dyn ThinqClient>,
    descriptor: DeviceDescriptor,
    model_info: Arc<ModelInfo>,
}

impl Device {
    pub fn new(
        client: Arc<dyn ThinqClient>,
        descriptor: DeviceDescriptor,
        model_info: Arc<ModelInfo>,
    ) -> Self {
        Self {
            client,
            descriptor,
            model_info,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.descriptor.device_id
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn model_info(&self) -> &Arc<ModelInfo> {
        &self.model_info
    }

    pub fn key(&self, key: StateKey) -> &'static str {
        key.resolve(self.model_info.is_info_v2())
    }

    /// Convert a raw enum value from the model info into a control value.
    ///
    /// V2 devices expect integer raw values as numbers.
    pub fn enum_control_value(&self, raw: String) -> Value {
        if self.model_info.is_info_v2() {
            if let Ok(n) = raw.parse::<i64>() {
                return Value::from(n);
            }
        }
        Value::String(raw)
    }

    /// Write a single value to the device.
    pub async fn set(&self, ctrl_key: &str, key: &str, value: Value) -> Result<(), ThinqError> {
        let command = if self.model_info.is_info_v2() {
            ControlCommand::V2 {
                ctrl_key: ctrl_key.to_string(),
                command: "Set".to_string(),
                data_key: key.to_string(),
                data_value: value,
            }
        } else {
            ControlCommand::V1 {
                key: key.to_string(),
                value,
            }
        };

        debug!("[{}] Sending control {:?}", self.descriptor.name, command);
        self.client.control(self.device_id(), command).await
    }

    /// Fetch the raw status snapshot of the device.
    pub async fn device_poll(&self) -> Result<Option<Snapshot>, ThinqError> {
        let snapshot = self.client.poll(self.device_id()).await?;
        if snapshot.is_none() {
            debug!("[{}] No status data available", self.descriptor.name);
        }
        Ok(snapshot)
    }
}

/// Raw status data decoded against the device's model info.
#[derive(Debug, Clone)]
pub struct DeviceStatus {
    model_info: Arc<ModelInfo>,
    data: Snapshot,
}

impl DeviceStatus {
    pub fn new(model_info: Arc<ModelInfo>, data: Option<Snapshot>) -> Self {
        Self {
            model_info,
            data: data.unwrap_or_default(),
        }
    }

    pub fn is_info_v2(&self) -> bool {
        self.model_info.is_info_v2()
    }

    pub fn key(&self, key: StateKey) -> &'static str {
        key.resolve(self.is_info_v2())
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    /// Vendor label of the enum value stored under `key`.
    pub fn lookup_enum(&self, key: &str) -> Option<String> {
        let raw = raw_key(self.data.get(key)?)?;
        match self.model_info.enum_name(key, &raw) {
            Some(label) => Some(label),
            // Some V1 firmwares report the label itself.
            None if raw.starts_with('@') => Some(raw),
            None => None,
        }
    }

    /// Numeric value stored under `key`; numeric strings are accepted.
    pub fn lookup_number(&self, key: &str) -> Option<f64> {
        number(self.data.get(key)?)
    }
}

fn raw_key(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::thinq::client::MockThinqClient;
    use crate::thinq::model_info::fixtures;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor {
            device_id: "dev-1".to_string(),
            name: "Bedroom".to_string(),
            model_name: None,
        }
    }

    #[test]
    fn test_state_key_resolution() {
        let key = StateKey::new("OpMode", "airState.opMode");
        assert_eq!(key.resolve(false), "OpMode");
        assert_eq!(key.resolve(true), "airState.opMode");
    }

    #[test]
    fn test_status_lookups() {
        let info = Arc::new(ModelInfo::new(fixtures::v2_model()));
        let data = json!({
            "airState.opMode": 4,
            "airState.tempState.current": "23.5",
            "airState.windStrength": 99
        });
        let Value::Object(map) = data else {
            unreachable!()
        };
        let status = DeviceStatus::new(info, Some(map));

        assert!(status.has_data());
        assert_eq!(
            status.lookup_enum("airState.opMode"),
            Some("@AC_MAIN_OPERATION_MODE_HEAT_W".to_string())
        );
        assert_eq!(status.lookup_enum("airState.windStrength"), None);
        assert_eq!(status.lookup_number("airState.tempState.current"), Some(23.5));
        assert_eq!(status.lookup_number("missing"), None);
    }

    #[test]
    fn test_label_passthrough() {
        let info = Arc::new(ModelInfo::new(fixtures::v1_model()));
        let Value::Object(map) = json!({ "OpMode": "@AC_MAIN_OPERATION_MODE_COOL_W" }) else {
            unreachable!()
        };
        let status = DeviceStatus::new(info, Some(map));
        assert_eq!(
            status.lookup_enum("OpMode"),
            Some("@AC_MAIN_OPERATION_MODE_COOL_W".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_uses_format_specific_command() {
        let client = Arc::new(MockThinqClient::new());

        let v1 = Device::new(
            client.clone(),
            descriptor(),
            Arc::new(ModelInfo::new(fixtures::v1_model())),
        );
        v1.set("basicCtrl", "OpMode", json!("1")).await.unwrap();

        let v2 = Device::new(
            client.clone(),
            descriptor(),
            Arc::new(ModelInfo::new(fixtures::v2_model())),
        );
        v2.set("basicCtrl", "airState.opMode", json!(1)).await.unwrap();

        let sent = client.sent();
        assert_eq!(
            sent[0].1,
            ControlCommand::V1 {
                key: "OpMode".to_string(),
                value: json!("1"),
            }
        );
        assert_eq!(
            sent[1].1,
            ControlCommand::V2 {
                ctrl_key: "basicCtrl".to_string(),
                command: "Set".to_string(),
                data_key: "airState.opMode".to_string(),
                data_value: json!(1),
            }
        );
    }

    #[test]
    fn test_enum_control_value() {
        let client = Arc::new(MockThinqClient::new());
        let v1 = Device::new(
            client.clone(),
            descriptor(),
            Arc::new(ModelInfo::new(fixtures::v1_model())),
        );
        let v2 = Device::new(
            client,
            descriptor(),
            Arc::new(ModelInfo::new(fixtures::v2_model())),
        );

        assert_eq!(v1.enum_control_value("3".to_string()), json!("3"));
        assert_eq!(v2.enum_control_value("3".to_string()), json!(3));
        assert_eq!(v2.enum_control_value("@X".to_string()), json!("@X"));
    }
}

//! Air conditioner devices.

use std::sync::Arc;

use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::debug;

use super::ThinqError;
use super::device::Device;
use super::device::DeviceStatus;
use super::device::StateKey;
use super::model_info::ModelInfo;
use super::model_info::ModelValue;

const AC_CTRL_BASIC: &str = "basicCtrl";

const SUPPORT_AC_OPERATION_MODE: StateKey =
    StateKey::new("SupportOpMode", "support.airState.opMode");
const SUPPORT_AC_WIND_STRENGTH: StateKey =
    StateKey::new("SupportWindStrength", "support.airState.windStrength");
const AC_STATE_OPERATION: StateKey = StateKey::new("Operation", "airState.operation");
const AC_STATE_OPERATION_MODE: StateKey = StateKey::new("OpMode", "airState.opMode");
const AC_STATE_CURRENT_TEMP: StateKey = StateKey::new("TempCur", "airState.tempState.current");
const AC_STATE_TARGET_TEMP: StateKey = StateKey::new("TempCfg", "airState.tempState.target");
const AC_STATE_WIND_STRENGTH: StateKey = StateKey::new("WindStrength", "airState.windStrength");

/// Whether a device is on or off.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AcOp {
    Off,
    On,
    /// Right fan only.
    RightOn,
    /// Left fan only.
    LeftOn,
    /// Both fans (or the only fan) on.
    AllOn,
}

impl AcOp {
    pub fn label(self) -> &'static str {
        match self {
            AcOp::Off => "@AC_MAIN_OPERATION_OFF_W",
            AcOp::On => "@AC_MAIN_OPERATION_ON_W",
            AcOp::RightOn => "@AC_MAIN_OPERATION_RIGHT_ON_W",
            AcOp::LeftOn => "@AC_MAIN_OPERATION_LEFT_ON_W",
            AcOp::AllOn => "@AC_MAIN_OPERATION_ALL_ON_W",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::iter().find(|op| op.label() == label)
    }
}

/// The operation mode for an AC/HVAC device.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AcMode {
    Cool,
    Dry,
    Fan,
    Heat,
    Aco,
    Ai,
    Airclean,
    Aroma,
    EnergySaving,
    EnergySaver,
}

impl AcMode {
    pub fn label(self) -> &'static str {
        match self {
            AcMode::Cool => "@AC_MAIN_OPERATION_MODE_COOL_W",
            AcMode::Dry => "@AC_MAIN_OPERATION_MODE_DRY_W",
            AcMode::Fan => "@AC_MAIN_OPERATION_MODE_FAN_W",
            AcMode::Heat => "@AC_MAIN_OPERATION_MODE_HEAT_W",
            AcMode::Aco => "@AC_MAIN_OPERATION_MODE_ACO_W",
            AcMode::Ai => "@AC_MAIN_OPERATION_MODE_AI_W",
            AcMode::Airclean => "@AC_MAIN_OPERATION_MODE_AIRCLEAN_W",
            AcMode::Aroma => "@AC_MAIN_OPERATION_MODE_AROMA_W",
            AcMode::EnergySaving => "@AC_MAIN_OPERATION_MODE_ENERGY_SAVING_W",
            AcMode::EnergySaver => "@AC_MAIN_OPERATION_MODE_ENERGY_SAVER_W",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::iter().find(|mode| mode.label() == label)
    }
}

/// The fan speed for an AC/HVAC device.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AcFanSpeed {
    Slow,
    SlowLow,
    Low,
    LowMid,
    Mid,
    MidHigh,
    High,
    Power,
    Auto,
    Nature,
    RLow,
    RMid,
    RHigh,
    LLow,
    LMid,
    LHigh,
}

impl AcFanSpeed {
    pub fn label(self) -> &'static str {
        match self {
            AcFanSpeed::Slow => "@AC_MAIN_WIND_STRENGTH_SLOW_W",
            AcFanSpeed::SlowLow => "@AC_MAIN_WIND_STRENGTH_SLOW_LOW_W",
            AcFanSpeed::Low => "@AC_MAIN_WIND_STRENGTH_LOW_W",
            AcFanSpeed::LowMid => "@AC_MAIN_WIND_STRENGTH_LOW_MID_W",
            AcFanSpeed::Mid => "@AC_MAIN_WIND_STRENGTH_MID_W",
            AcFanSpeed::MidHigh => "@AC_MAIN_WIND_STRENGTH_MID_HIGH_W",
            AcFanSpeed::High => "@AC_MAIN_WIND_STRENGTH_HIGH_W",
            AcFanSpeed::Power => "@AC_MAIN_WIND_STRENGTH_POWER_W",
            AcFanSpeed::Auto => "@AC_MAIN_WIND_STRENGTH_AUTO_W",
            AcFanSpeed::Nature => "@AC_MAIN_WIND_STRENGTH_NATURE_W",
            AcFanSpeed::RLow => "@AC_MAIN_WIND_STRENGTH_LOW_RIGHT_W",
            AcFanSpeed::RMid => "@AC_MAIN_WIND_STRENGTH_MID_RIGHT_W",
            AcFanSpeed::RHigh => "@AC_MAIN_WIND_STRENGTH_HIGH_RIGHT_W",
            AcFanSpeed::LLow => "@AC_MAIN_WIND_STRENGTH_LOW_LEFT_W",
            AcFanSpeed::LMid => "@AC_MAIN_WIND_STRENGTH_MID_LEFT_W",
            AcFanSpeed::LHigh => "@AC_MAIN_WIND_STRENGTH_HIGH_LEFT_W",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::iter().find(|speed| speed.label() == label)
    }
}

/// Labels of the enum options the model advertises under `key`, in raw value order.
fn supported_labels(info: &ModelInfo, key: &str) -> Vec<String> {
    match info.value(key) {
        Some(ModelValue::Enum(options)) => options.into_values().collect(),
        Some(other) => {
            debug!("Model value {} is not an enum: {:?}", key, other);
            Vec::new()
        }
        None => {
            debug!("Model info has no value for {}", key);
            Vec::new()
        }
    }
}

fn known<T: PartialEq>(labels: &[String], from_label: fn(&str) -> Option<T>) -> Vec<T> {
    let mut out = Vec::new();
    for item in labels.iter().filter_map(|l| from_label(l)) {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Whole numbers are sent without a fractional part.
fn temperature_value(temp: f64) -> Value {
    if temp.fract() == 0.0 && temp.abs() < i64::MAX as f64 {
        Value::from(temp as i64)
    } else {
        Value::from(temp)
    }
}

/// A higher-level interface for an air conditioner.
///
/// The capabilities advertised by the model info are resolved once at
/// construction; they never change for a given model.
pub struct AirConditionerDevice {
    device: Device,
    supported_operations: Vec<AcOp>,
    op_modes: Vec<AcMode>,
    fan_speeds: Vec<AcFanSpeed>,
    temperature_range: Option<(f64, f64)>,
}

impl AirConditionerDevice {
    pub fn new(device: Device) -> Self {
        let info = device.model_info().clone();

        let supported_operations = known(
            &supported_labels(&info, device.key(AC_STATE_OPERATION)),
            AcOp::from_label,
        );
        let op_modes = known(
            &supported_labels(&info, device.key(SUPPORT_AC_OPERATION_MODE)),
            AcMode::from_label,
        );
        let fan_speeds = known(
            &supported_labels(&info, device.key(SUPPORT_AC_WIND_STRENGTH)),
            AcFanSpeed::from_label,
        );
        let temperature_range = match info.value(device.key(AC_STATE_TARGET_TEMP)) {
            Some(ModelValue::Range { min, max, .. }) => Some((min, max)),
            _ => None,
        };

        Self {
            device,
            supported_operations,
            op_modes,
            fan_speeds,
            temperature_range,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Operating modes the model supports.
    pub fn op_modes(&self) -> &[AcMode] {
        &self.op_modes
    }

    /// Fan speeds the model supports.
    pub fn fan_speeds(&self) -> &[AcFanSpeed] {
        &self.fan_speeds
    }

    pub fn target_temperature_step(&self) -> f64 {
        1.0
    }

    pub fn target_temperature_min(&self) -> Option<f64> {
        self.temperature_range.map(|(min, _)| min)
    }

    pub fn target_temperature_max(&self) -> Option<f64> {
        self.temperature_range.map(|(_, max)| max)
    }

    /// The most correct "on" operation the device supports.
    ///
    /// Newer models advertise ALL_ON, V2 models ON. Older models (the
    /// LP1419IVSM for one) only advertise a single operation such as
    /// RIGHT_ON. Several on operations without ALL_ON or ON is an error:
    /// there is no way to tell which one turns everything on.
    pub fn supported_on_operation(&self) -> Result<AcOp, ThinqError> {
        let operations: Vec<AcOp> = self
            .supported_operations
            .iter()
            .copied()
            .filter(|op| *op != AcOp::Off)
            .collect();

        if operations.contains(&AcOp::AllOn) {
            return Ok(AcOp::AllOn);
        }
        if operations.contains(&AcOp::On) {
            return Ok(AcOp::On);
        }
        if let [op] = operations.as_slice() {
            return Ok(*op);
        }

        Err(ThinqError::AmbiguousOnOperation(operations))
    }

    /// Turn the device on or off.
    pub async fn power(&self, turn_on: bool) -> Result<(), ThinqError> {
        let op = if turn_on {
            self.supported_on_operation()?
        } else {
            AcOp::Off
        };
        self.set_enum(AC_STATE_OPERATION, op.label()).await
    }

    /// Set the device's operating mode.
    pub async fn set_op_mode(&self, mode: AcMode) -> Result<(), ThinqError> {
        if !self.op_modes.contains(&mode) {
            return Err(ThinqError::InvalidOperatingMode(mode.to_string()));
        }
        self.set_enum(AC_STATE_OPERATION_MODE, mode.label()).await
    }

    /// Set the fan speed.
    pub async fn set_fan_speed(&self, speed: AcFanSpeed) -> Result<(), ThinqError> {
        if !self.fan_speeds.contains(&speed) {
            return Err(ThinqError::InvalidFanSpeed(speed.to_string()));
        }
        self.set_enum(AC_STATE_WIND_STRENGTH, speed.label()).await
    }

    /// Set the target temperature in degrees Celsius.
    pub async fn set_target_temp(&self, temp: f64) -> Result<(), ThinqError> {
        if let Some((min, max)) = self.temperature_range {
            if !(min..=max).contains(&temp) {
                return Err(ThinqError::TargetTemperatureOutOfRange(temp));
            }
        }
        let key = self.device.key(AC_STATE_TARGET_TEMP);
        self.device
            .set(AC_CTRL_BASIC, key, temperature_value(temp))
            .await
    }

    async fn set_enum(&self, key: StateKey, label: &str) -> Result<(), ThinqError> {
        let key = self.device.key(key);
        let raw = self
            .device
            .model_info()
            .enum_value(key, label)
            .ok_or_else(|| ThinqError::MissingEnumValue {
                key: key.to_string(),
                label: label.to_string(),
            })?;
        let value = self.device.enum_control_value(raw);
        self.device.set(AC_CTRL_BASIC, key, value).await
    }

    /// Status with no data, used before the first successful poll.
    pub fn empty_status(&self) -> AirConditionerStatus {
        AirConditionerStatus::new(self.device.model_info().clone(), None)
    }

    /// Poll the device's current state.
    pub async fn poll(&self) -> Result<Option<AirConditionerStatus>, ThinqError> {
        let Some(data) = self.device.device_poll().await? else {
            return Ok(None);
        };
        Ok(Some(AirConditionerStatus::new(
            self.device.model_info().clone(),
            Some(data),
        )))
    }
}

/// Higher-level information about an air conditioner's current status.
#[derive(Debug, Clone)]
pub struct AirConditionerStatus {
    status: DeviceStatus,
}

impl AirConditionerStatus {
    pub fn new(model_info: Arc<ModelInfo>, data: Option<super::client::Snapshot>) -> Self {
        Self {
            status: DeviceStatus::new(model_info, data),
        }
    }

    pub fn has_data(&self) -> bool {
        self.status.has_data()
    }

    pub fn operation(&self) -> Option<AcOp> {
        let key = self.status.key(AC_STATE_OPERATION);
        AcOp::from_label(&self.status.lookup_enum(key)?)
    }

    pub fn is_on(&self) -> bool {
        matches!(self.operation(), Some(op) if op != AcOp::Off)
    }

    pub fn operation_mode(&self) -> Option<AcMode> {
        let key = self.status.key(AC_STATE_OPERATION_MODE);
        AcMode::from_label(&self.status.lookup_enum(key)?)
    }

    pub fn fan_speed(&self) -> Option<AcFanSpeed> {
        let key = self.status.key(AC_STATE_WIND_STRENGTH);
        AcFanSpeed::from_label(&self.status.lookup_enum(key)?)
    }

    pub fn current_temp(&self) -> Option<f64> {
        self.status
            .lookup_number(self.status.key(AC_STATE_CURRENT_TEMP))
    }

    pub fn target_temp(&self) -> Option<f64> {
        self.status
            .lookup_number(self.status.key(AC_STATE_TARGET_TEMP))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;
    use crate::thinq::client::ControlCommand;
    use crate::thinq::client::MockThinqClient;
    use crate::thinq::device::DeviceDescriptor;
    use crate::thinq::model_info::fixtures;

    fn ac(client: &Arc<MockThinqClient>, model: Value) -> AirConditionerDevice {
        let device = Device::new(
            client.clone(),
            DeviceDescriptor {
                device_id: "ac-1".to_string(),
                name: "Living Room".to_string(),
                model_name: None,
            },
            Arc::new(ModelInfo::new(model)),
        );
        AirConditionerDevice::new(device)
    }

    fn model_with_operations(labels: &[&str]) -> Value {
        let options: serde_json::Map<String, Value> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (i.to_string(), json!(l)))
            .collect();
        json!({ "Value": { "Operation": { "type": "Enum", "option": options } } })
    }

    #[test]
    fn test_names_match_vendor_enum_names() {
        assert_eq!(AcMode::Ai.to_string(), "AI");
        assert_eq!(AcMode::EnergySaving.to_string(), "ENERGY_SAVING");
        assert_eq!(AcFanSpeed::RLow.to_string(), "R_LOW");
        assert_eq!(AcFanSpeed::from_str("MID_HIGH").unwrap(), AcFanSpeed::MidHigh);
        assert_eq!(AcOp::AllOn.to_string(), "ALL_ON");
        assert!(AcFanSpeed::from_str("TURBO").is_err());
    }

    #[test]
    fn test_labels_round_trip() {
        for mode in AcMode::iter() {
            assert_eq!(AcMode::from_label(mode.label()), Some(mode));
        }
        for speed in AcFanSpeed::iter() {
            assert_eq!(AcFanSpeed::from_label(speed.label()), Some(speed));
        }
        assert_eq!(AcMode::from_label("@AC_MAIN_OPERATION_MODE_UNKNOWN_W"), None);
    }

    #[test]
    fn test_capabilities_v1() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, fixtures::v1_model());

        assert_eq!(ac.op_modes(), &[AcMode::Cool, AcMode::Dry, AcMode::Fan]);
        assert_eq!(ac.fan_speeds(), &[AcFanSpeed::High, AcFanSpeed::Low]);
        assert_eq!(ac.target_temperature_min(), Some(16.0));
        assert_eq!(ac.target_temperature_max(), Some(30.0));
        assert_eq!(ac.target_temperature_step(), 1.0);
    }

    #[test]
    fn test_capabilities_skip_unknown_labels() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, fixtures::v2_model());

        assert_eq!(
            ac.op_modes(),
            &[
                AcMode::Cool,
                AcMode::Dry,
                AcMode::Fan,
                AcMode::Heat,
                AcMode::Airclean,
                AcMode::Aco
            ]
        );
        assert_eq!(ac.fan_speeds().len(), 4);
    }

    #[test]
    fn test_missing_capabilities() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, json!({ "Value": {} }));

        assert!(ac.op_modes().is_empty());
        assert!(ac.fan_speeds().is_empty());
        assert_eq!(ac.target_temperature_min(), None);
        assert_eq!(ac.target_temperature_max(), None);
    }

    #[test]
    fn test_on_operation_selection() {
        let client = Arc::new(MockThinqClient::new());

        let all_on = ac(
            &client,
            model_with_operations(&[
                "@AC_MAIN_OPERATION_OFF_W",
                "@AC_MAIN_OPERATION_RIGHT_ON_W",
                "@AC_MAIN_OPERATION_ALL_ON_W",
            ]),
        );
        assert_eq!(all_on.supported_on_operation().unwrap(), AcOp::AllOn);

        let on = ac(
            &client,
            model_with_operations(&["@AC_MAIN_OPERATION_OFF_W", "@AC_MAIN_OPERATION_ON_W"]),
        );
        assert_eq!(on.supported_on_operation().unwrap(), AcOp::On);

        let single = ac(
            &client,
            model_with_operations(&[
                "@AC_MAIN_OPERATION_OFF_W",
                "@AC_MAIN_OPERATION_RIGHT_ON_W",
            ]),
        );
        assert_eq!(single.supported_on_operation().unwrap(), AcOp::RightOn);

        let ambiguous = ac(
            &client,
            model_with_operations(&[
                "@AC_MAIN_OPERATION_OFF_W",
                "@AC_MAIN_OPERATION_RIGHT_ON_W",
                "@AC_MAIN_OPERATION_LEFT_ON_W",
            ]),
        );
        let err = ambiguous.supported_on_operation().unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"could not determine correct 'on' operation: too many reported operations: [RightOn, LeftOn]"
        );
    }

    #[tokio::test]
    async fn test_power_v2() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, fixtures::v2_model());

        ac.power(true).await.unwrap();
        ac.power(false).await.unwrap();

        let sent = client.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "ac-1");
        assert_eq!(
            sent[0].1,
            ControlCommand::V2 {
                ctrl_key: "basicCtrl".to_string(),
                command: "Set".to_string(),
                data_key: "airState.operation".to_string(),
                data_value: json!(3),
            }
        );
        assert_eq!(
            sent[1].1,
            ControlCommand::V2 {
                ctrl_key: "basicCtrl".to_string(),
                command: "Set".to_string(),
                data_key: "airState.operation".to_string(),
                data_value: json!(0),
            }
        );
    }

    #[tokio::test]
    async fn test_set_op_mode_v1() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, fixtures::v1_model());

        ac.set_op_mode(AcMode::Dry).await.unwrap();
        assert_eq!(
            client.sent()[0].1,
            ControlCommand::V1 {
                key: "OpMode".to_string(),
                value: json!("1"),
            }
        );

        // HEAT exists in the model but is not advertised as supported.
        let err = ac.set_op_mode(AcMode::Heat).await.unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Invalid operating mode: HEAT");
        assert_eq!(client.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_set_fan_speed() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, fixtures::v1_model());

        ac.set_fan_speed(AcFanSpeed::High).await.unwrap();
        assert_eq!(
            client.sent()[0].1,
            ControlCommand::V1 {
                key: "WindStrength".to_string(),
                value: json!("6"),
            }
        );

        let err = ac.set_fan_speed(AcFanSpeed::Mid).await.unwrap_err();
        assert!(matches!(err, ThinqError::InvalidFanSpeed(ref s) if s == "MID"));
    }

    #[tokio::test]
    async fn test_set_target_temp_range() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, fixtures::v2_model());

        ac.set_target_temp(22.0).await.unwrap();
        ac.set_target_temp(22.5).await.unwrap();
        let err = ac.set_target_temp(31.0).await.unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Target temperature out of range: 31");

        let sent = client.sent();
        assert_eq!(sent.len(), 2);
        let ControlCommand::V2 { data_value, .. } = &sent[0].1 else {
            panic!("expected V2 command");
        };
        assert_eq!(data_value, &json!(22));
        let ControlCommand::V2 { data_value, .. } = &sent[1].1 else {
            panic!("expected V2 command");
        };
        assert_eq!(data_value, &json!(22.5));
    }

    #[tokio::test]
    async fn test_set_target_temp_without_range() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, json!({ "Value": {} }));

        ac.set_target_temp(50.0).await.unwrap();
        assert_eq!(client.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_poll_and_status() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, fixtures::v1_model());

        assert!(ac.poll().await.unwrap().is_none());

        client.set_snapshot(
            "ac-1",
            json!({
                "Operation": "1",
                "OpMode": "0",
                "WindStrength": "2",
                "TempCur": "25",
                "TempCfg": "21.5"
            }),
        );
        let status = ac.poll().await.unwrap().unwrap();

        assert!(status.is_on());
        assert_eq!(status.operation(), Some(AcOp::RightOn));
        assert_eq!(status.operation_mode(), Some(AcMode::Cool));
        assert_eq!(status.fan_speed(), Some(AcFanSpeed::Low));
        assert_eq!(status.current_temp(), Some(25.0));
        assert_eq!(status.target_temp(), Some(21.5));
    }

    #[test]
    fn test_empty_status() {
        let client = Arc::new(MockThinqClient::new());
        let ac = ac(&client, fixtures::v2_model());
        let status = ac.empty_status();

        assert!(!status.has_data());
        assert!(!status.is_on());
        assert_eq!(status.operation(), None);
        assert_eq!(status.operation_mode(), None);
        assert_eq!(status.fan_speed(), None);
        assert_eq!(status.current_temp(), None);
    }

    #[test]
    fn test_status_unknown_and_off() {
        let info = Arc::new(ModelInfo::new(fixtures::v2_model()));
        let Value::Object(data) = json!({
            "airState.operation": 0,
            "airState.opMode": 77,
            "airState.tempState.target": ""
        }) else {
            unreachable!()
        };
        let status = AirConditionerStatus::new(info, Some(data));

        assert!(!status.is_on());
        assert_eq!(status.operation(), Some(AcOp::Off));
        assert_eq!(status.operation_mode(), None);
        assert_eq!(status.target_temp(), None);
    }
}

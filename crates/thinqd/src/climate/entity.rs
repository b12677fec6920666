use async_trait::async_trait;

use super::DEFAULT_MAX_TEMP;
use super::DEFAULT_MIN_TEMP;
use super::hvac::ClimateEntityFeature;
use super::hvac::HvacMode;
use super::hvac::TemperatureUnit;
use crate::engine::ClimateState;
use crate::engine::DeviceInfo;

#[derive(Debug, thiserror::Error)]
pub enum ClimateError {
    #[error("Invalid hvac_mode [{0}]")]
    InvalidHvacMode(HvacMode),

    #[error("Invalid fan_mode [{0}]")]
    InvalidFanMode(String),

    #[error("{0}")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Contract every climate entity implements.
///
/// Getters are read-through: they reflect the latest state the integration
/// holds for the device and never touch the network. Setters talk to the
/// device and leave refreshing state to the integration.
#[async_trait]
pub trait ClimateEntity: Send + Sync {
    fn unique_id(&self) -> String;

    fn name(&self) -> &str;

    fn available(&self) -> bool {
        true
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        None
    }

    /// Current operating mode, `None` when the device reports a mode the
    /// platform has no equivalent for.
    fn hvac_mode(&self) -> Option<HvacMode>;

    fn hvac_modes(&self) -> Vec<HvacMode>;

    fn current_temperature(&self) -> Option<f64> {
        None
    }

    fn target_temperature(&self) -> Option<f64> {
        None
    }

    fn target_temperature_step(&self) -> Option<f64> {
        None
    }

    fn temperature_unit(&self) -> TemperatureUnit;

    fn fan_mode(&self) -> Option<String> {
        None
    }

    fn fan_modes(&self) -> Vec<String> {
        Vec::new()
    }

    fn supported_features(&self) -> ClimateEntityFeature {
        ClimateEntityFeature::empty()
    }

    fn min_temp(&self) -> f64 {
        DEFAULT_MIN_TEMP
    }

    fn max_temp(&self) -> f64 {
        DEFAULT_MAX_TEMP
    }

    async fn set_hvac_mode(&self, hvac_mode: HvacMode) -> Result<(), ClimateError>;

    /// Set the target temperature; `None` re-applies the current target.
    async fn set_temperature(&self, temperature: Option<f64>) -> Result<(), ClimateError>;

    async fn set_fan_mode(&self, fan_mode: &str) -> Result<(), ClimateError>;

    async fn turn_on(&self) -> Result<(), ClimateError>;

    async fn turn_off(&self) -> Result<(), ClimateError>;
}

/// Capture the entity's current surface as a [`ClimateState`].
pub fn snapshot(entity: &dyn ClimateEntity) -> ClimateState {
    ClimateState {
        name: entity.name().to_string(),
        unique_id: entity.unique_id(),
        available: entity.available(),
        hvac_mode: entity.hvac_mode(),
        hvac_modes: entity.hvac_modes(),
        current_temperature: entity.current_temperature(),
        target_temperature: entity.target_temperature(),
        target_temperature_step: entity.target_temperature_step(),
        temperature_unit: entity.temperature_unit(),
        min_temp: entity.min_temp(),
        max_temp: entity.max_temp(),
        fan_mode: entity.fan_mode(),
        fan_modes: entity.fan_modes(),
        supported_features: entity.supported_features(),
    }
}

/// A control request addressed to a climate entity.
#[derive(Debug, Clone, PartialEq)]
pub enum ClimateCommand {
    SetHvacMode(HvacMode),
    SetTemperature(Option<f64>),
    SetFanMode(String),
    TurnOn,
    TurnOff,
}

impl ClimateCommand {
    pub async fn execute(self, entity: &dyn ClimateEntity) -> Result<(), ClimateError> {
        match self {
            ClimateCommand::SetHvacMode(mode) => entity.set_hvac_mode(mode).await,
            ClimateCommand::SetTemperature(temperature) => entity.set_temperature(temperature).await,
            ClimateCommand::SetFanMode(fan_mode) => entity.set_fan_mode(&fan_mode).await,
            ClimateCommand::TurnOn => entity.turn_on().await,
            ClimateCommand::TurnOff => entity.turn_off().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Minimal entity relying on the trait defaults.
    #[derive(Default)]
    struct Thermostat {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ClimateEntity for Thermostat {
        fn unique_id(&self) -> String {
            "thermostat-1".to_string()
        }

        fn name(&self) -> &str {
            "Hallway"
        }

        fn hvac_mode(&self) -> Option<HvacMode> {
            Some(HvacMode::Heat)
        }

        fn hvac_modes(&self) -> Vec<HvacMode> {
            vec![HvacMode::Off, HvacMode::Heat]
        }

        fn temperature_unit(&self) -> TemperatureUnit {
            TemperatureUnit::Celsius
        }

        async fn set_hvac_mode(&self, hvac_mode: HvacMode) -> Result<(), ClimateError> {
            if hvac_mode == HvacMode::Cool {
                return Err(ClimateError::InvalidHvacMode(hvac_mode));
            }
            self.calls.lock().unwrap().push(format!("mode:{hvac_mode}"));
            Ok(())
        }

        async fn set_temperature(&self, temperature: Option<f64>) -> Result<(), ClimateError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("temp:{temperature:?}"));
            Ok(())
        }

        async fn set_fan_mode(&self, fan_mode: &str) -> Result<(), ClimateError> {
            Err(ClimateError::InvalidFanMode(fan_mode.to_string()))
        }

        async fn turn_on(&self) -> Result<(), ClimateError> {
            self.calls.lock().unwrap().push("on".to_string());
            Ok(())
        }

        async fn turn_off(&self) -> Result<(), ClimateError> {
            self.calls.lock().unwrap().push("off".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_snapshot_uses_defaults() {
        let state = snapshot(&Thermostat::default());

        assert_eq!(state.name, "Hallway");
        assert!(state.available);
        assert_eq!(state.hvac_mode, Some(HvacMode::Heat));
        assert_eq!(state.min_temp, DEFAULT_MIN_TEMP);
        assert_eq!(state.max_temp, DEFAULT_MAX_TEMP);
        assert_eq!(state.supported_features, ClimateEntityFeature::empty());
        assert!(state.fan_modes.is_empty());
    }

    #[tokio::test]
    async fn test_command_dispatch() {
        let entity = Thermostat::default();

        ClimateCommand::SetHvacMode(HvacMode::Heat)
            .execute(&entity)
            .await
            .unwrap();
        ClimateCommand::SetTemperature(Some(20.5))
            .execute(&entity)
            .await
            .unwrap();
        ClimateCommand::TurnOff.execute(&entity).await.unwrap();

        let err = ClimateCommand::SetHvacMode(HvacMode::Cool)
            .execute(&entity)
            .await
            .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Invalid hvac_mode [cool]");

        let err = ClimateCommand::SetFanMode("TURBO".to_string())
            .execute(&entity)
            .await
            .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Invalid fan_mode [TURBO]");

        assert_eq!(
            *entity.calls.lock().unwrap(),
            vec!["mode:heat", "temp:Some(20.5)", "off"]
        );
    }
}

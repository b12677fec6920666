//! Climate entities for LG air conditioners.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::device::LgeDevice;
use crate::climate::ClimateEntity;
use crate::climate::ClimateEntityFeature;
use crate::climate::ClimateError;
use crate::climate::HvacMode;
use crate::climate::TemperatureUnit;
use crate::engine::DeviceInfo;
use crate::thinq::AcFanSpeed;
use crate::thinq::AcMode;
use crate::thinq::ThinqError;

/// Vendor operating modes with a platform equivalent. The reverse direction
/// is read off the same table.
const HVAC_MODE_LOOKUP: [(AcMode, HvacMode); 6] = [
    (AcMode::Ai, HvacMode::Auto),
    (AcMode::Heat, HvacMode::Heat),
    (AcMode::Dry, HvacMode::Dry),
    (AcMode::Cool, HvacMode::Cool),
    (AcMode::Fan, HvacMode::FanOnly),
    (AcMode::Aco, HvacMode::HeatCool),
];

pub(crate) fn hvac_mode_for(mode: AcMode) -> Option<HvacMode> {
    HVAC_MODE_LOOKUP
        .iter()
        .find(|(ac, _)| *ac == mode)
        .map(|(_, hvac)| *hvac)
}

pub(crate) fn ac_mode_for(hvac_mode: HvacMode) -> Option<AcMode> {
    HVAC_MODE_LOOKUP
        .iter()
        .find(|(_, hvac)| *hvac == hvac_mode)
        .map(|(ac, _)| *ac)
}

impl From<ThinqError> for ClimateError {
    fn from(e: ThinqError) -> Self {
        ClimateError::Device(Box::new(e))
    }
}

/// Air-to-air climate device.
pub struct LgeAcClimate {
    api: Arc<LgeDevice>,
}

impl LgeAcClimate {
    pub fn new(api: Arc<LgeDevice>) -> Self {
        Self { api }
    }

    /// The coordinator this entity reads from
    pub fn device(&self) -> &Arc<LgeDevice> {
        &self.api
    }
}

#[async_trait]
impl ClimateEntity for LgeAcClimate {
    fn unique_id(&self) -> String {
        format!("{}-AC", self.api.unique_id())
    }

    fn name(&self) -> &str {
        self.api.name()
    }

    fn available(&self) -> bool {
        self.api.available()
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        Some(self.api.device_info().clone())
    }

    fn hvac_mode(&self) -> Option<HvacMode> {
        let state = self.api.state();
        match state.operation_mode() {
            Some(mode) if state.is_on() => hvac_mode_for(mode),
            _ => Some(HvacMode::Off),
        }
    }

    fn hvac_modes(&self) -> Vec<HvacMode> {
        std::iter::once(HvacMode::Off)
            .chain(
                self.api
                    .device()
                    .op_modes()
                    .iter()
                    .filter_map(|mode| hvac_mode_for(*mode)),
            )
            .collect()
    }

    fn current_temperature(&self) -> Option<f64> {
        self.api.state().current_temp()
    }

    fn target_temperature(&self) -> Option<f64> {
        self.api.state().target_temp()
    }

    fn target_temperature_step(&self) -> Option<f64> {
        Some(self.api.device().target_temperature_step())
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    fn fan_mode(&self) -> Option<String> {
        self.api.state().fan_speed().map(|speed| speed.to_string())
    }

    fn fan_modes(&self) -> Vec<String> {
        self.api
            .device()
            .fan_speeds()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn supported_features(&self) -> ClimateEntityFeature {
        ClimateEntityFeature::FAN_MODE | ClimateEntityFeature::TARGET_TEMPERATURE
    }

    fn min_temp(&self) -> f64 {
        self.api
            .device()
            .target_temperature_min()
            .unwrap_or(crate::climate::DEFAULT_MIN_TEMP)
    }

    fn max_temp(&self) -> f64 {
        self.api
            .device()
            .target_temperature_max()
            .unwrap_or(crate::climate::DEFAULT_MAX_TEMP)
    }

    async fn set_hvac_mode(&self, hvac_mode: HvacMode) -> Result<(), ClimateError> {
        if hvac_mode == HvacMode::Off {
            self.api.device().power(false).await?;
            return Ok(());
        }

        let operation_mode =
            ac_mode_for(hvac_mode).ok_or(ClimateError::InvalidHvacMode(hvac_mode))?;

        if self.hvac_mode() == Some(HvacMode::Off) {
            debug!("[{}] Powering on before switching to {}", self.name(), hvac_mode);
            self.api.device().power(true).await?;
        }
        self.api.device().set_op_mode(operation_mode).await?;
        Ok(())
    }

    async fn set_temperature(&self, temperature: Option<f64>) -> Result<(), ClimateError> {
        let Some(temperature) = temperature.or_else(|| self.target_temperature()) else {
            return Err(ClimateError::Device(
                "no target temperature given and none reported by the device".into(),
            ));
        };
        self.api.device().set_target_temp(temperature).await?;
        Ok(())
    }

    async fn set_fan_mode(&self, fan_mode: &str) -> Result<(), ClimateError> {
        let speed = AcFanSpeed::from_str(fan_mode)
            .map_err(|_| ClimateError::InvalidFanMode(fan_mode.to_string()))?;
        self.api.device().set_fan_speed(speed).await?;
        Ok(())
    }

    async fn turn_on(&self) -> Result<(), ClimateError> {
        self.api.device().power(true).await?;
        Ok(())
    }

    async fn turn_off(&self) -> Result<(), ClimateError> {
        self.api.device().power(false).await?;
        Ok(())
    }
}

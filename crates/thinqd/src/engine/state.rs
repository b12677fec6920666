use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use super::device::Device;
use crate::climate::ClimateEntityFeature;
use crate::climate::HvacMode;
use crate::climate::TemperatureUnit;

/// State of a climate entity.
///
/// A flattened copy of everything the entity exposes, taken after each
/// refresh. Integrations compare snapshots to decide whether to report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClimateState {
    pub name: String,

    pub unique_id: String,

    pub available: bool,

    /// `None` when the device runs a mode with no platform equivalent.
    pub hvac_mode: Option<HvacMode>,

    pub hvac_modes: Vec<HvacMode>,

    pub current_temperature: Option<f64>,

    /// Temperature the device tries to reach.
    pub target_temperature: Option<f64>,

    pub target_temperature_step: Option<f64>,

    pub temperature_unit: TemperatureUnit,

    pub min_temp: f64,

    pub max_temp: f64,

    pub fan_mode: Option<String>,

    pub fan_modes: Vec<String>,

    pub supported_features: ClimateEntityFeature,
}

/// Centralized snapshot of the entire engine state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub climates: HashMap<String, ClimateState>,

    /// Device registry, keyed by device id.
    pub devices: BTreeMap<String, Device>,
}

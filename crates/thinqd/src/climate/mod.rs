//! Climate platform.
//!
//! The standardized surface climate integrations expose to the engine:
//! operating modes, fan modes, temperature bounds and feature flags.

mod entity;
mod hvac;

pub use entity::ClimateCommand;
pub use entity::ClimateEntity;
pub use entity::ClimateError;
pub use entity::snapshot;
pub use hvac::ClimateEntityFeature;
pub use hvac::HvacMode;
pub use hvac::TemperatureUnit;

/// Lower target bound used when a device does not report one (°C).
pub const DEFAULT_MIN_TEMP: f64 = 7.0;

/// Upper target bound used when a device does not report one (°C).
pub const DEFAULT_MAX_TEMP: f64 = 35.0;

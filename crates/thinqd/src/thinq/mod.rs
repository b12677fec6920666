//! Device abstraction over the LG ThinQ cloud API.
//!
//! Covers what the climate adapter calls through: model metadata, status
//! decoding and the air conditioner control surface. Transport lives behind
//! [`ThinqClient`].

mod ac;
mod client;
mod device;
mod model_info;

pub use ac::AcFanSpeed;
pub use ac::AcMode;
pub use ac::AcOp;
pub use ac::AirConditionerDevice;
pub use ac::AirConditionerStatus;
pub use client::ControlCommand;
#[cfg(test)]
pub use client::MockThinqClient;
pub use client::Snapshot;
pub use client::ThinqClient;
pub use device::Device;
pub use device::DeviceDescriptor;
pub use device::DeviceStatus;
pub use device::StateKey;
pub use model_info::InfoVersion;
pub use model_info::ModelInfo;
pub use model_info::ModelValue;

#[cfg(test)]
pub(crate) use model_info::fixtures;

#[derive(Debug, thiserror::Error)]
pub enum ThinqError {
    #[error("Invalid operating mode: {0}")]
    InvalidOperatingMode(String),

    #[error("Invalid fan speed: {0}")]
    InvalidFanSpeed(String),

    #[error("Target temperature out of range: {0}")]
    TargetTemperatureOutOfRange(f64),

    #[error("could not determine correct 'on' operation: too many reported operations: {0:?}")]
    AmbiguousOnOperation(Vec<AcOp>),

    #[error("Model info has no option '{label}' for {key}")]
    MissingEnumValue { key: String, label: String },

    #[error("Unsupported request: {0}")]
    Unsupported(String),

    #[error("ThinQ API error: {0}")]
    Api(String),

    #[error("Failed to decode ThinQ response: {0}")]
    Decode(#[from] serde_json::Error),

    #[cfg(feature = "thinq_http")]
    #[error("ThinQ request failed: {0}")]
    Http(#[from] reqwest::Error),
}

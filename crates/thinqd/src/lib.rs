pub mod api;
pub mod climate;
pub mod config;
mod engine;
mod integrations;
pub mod thinq;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use engine::ClimateState;
pub use engine::DeviceInfo;
pub use engine::Engine;
pub use engine::EngineError;
pub use engine::State;
pub use integrations::lge::LgeConfig;

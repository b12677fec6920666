//! Type-safe message system for thinqd
//!
//! Messages are split by direction to enforce correct usage at compile time:
//! - `FromIntegrationMessage`: Events from integrations to the engine
//! - `ToIntegrationMessage`: Commands from the engine to integrations

use tokio::sync::oneshot;

use super::device::DeviceInfo;
use super::state::ClimateState;
use crate::climate::ClimateCommand;

/// Outcome of a command, reported back to whoever issued it.
pub type CommandReply = oneshot::Sender<Result<(), String>>;

/// Messages FROM integrations TO the engine (events/state updates)
#[derive(Debug)]
pub enum FromIntegrationMessage {
    /// An entity was discovered and registered
    EntityDiscovered {
        entity_id: String,
        integration_name: String,
        device: Option<DeviceInfo>,
    },

    /// A climate entity's state changed
    ClimateStateChanged {
        entity_id: String,
        state: ClimateState,
    },
}

/// Messages FROM the engine TO integrations (commands)
#[derive(Debug)]
pub enum ToIntegrationMessage {
    /// Command for a climate entity
    ClimateCommand {
        entity_id: String,
        command: ClimateCommand,
        reply: Option<CommandReply>,
    },
}

impl ToIntegrationMessage {
    /// Entity the message is addressed to, used for routing.
    pub fn entity_id(&self) -> &str {
        match self {
            ToIntegrationMessage::ClimateCommand { entity_id, .. } => entity_id,
        }
    }
}

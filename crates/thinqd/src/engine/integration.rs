use std::error::Error;

use async_trait::async_trait;
use linkme::distributed_slice;
use tokio::sync::mpsc;

use super::message::FromIntegrationMessage;
use super::message::ToIntegrationMessage;
use crate::config::Config;

/// Entity announcements and state reports, integration -> engine.
///
/// Bounded: an integration polling faster than the engine applies state waits.
pub type FromIntegrationSender = mpsc::Sender<FromIntegrationMessage>;
pub type FromIntegrationReceiver = mpsc::Receiver<FromIntegrationMessage>;

/// Climate commands, engine -> integration. Unbounded so routing never blocks
/// an API request.
pub type ToIntegrationSender = mpsc::UnboundedSender<ToIntegrationMessage>;

/// `Ok(None)` when the integration's config section is absent or disabled.
pub type IntegrationFactoryResult = anyhow::Result<Option<Box<dyn Integration>>>;

/// What a factory gets to build its integration from.
pub struct IntegrationContext<'a> {
    pub config: &'a Config,
}

/// Factories for every compiled-in integration, run once at startup.
#[distributed_slice]
pub static REGISTRY: [fn(&IntegrationContext) -> IntegrationFactoryResult];

/// A source of climate entities.
///
/// The engine runs each integration in its own task: `setup` once, then
/// `handle_message` for every command addressed to one of its entities,
/// then `shutdown` when the command channel closes.
#[async_trait]
pub trait Integration: Send + Sync {
    /// Name the engine routes by; also the domain of its device identifiers.
    fn name(&self) -> &str;

    /// Announce every entity with `EntityDiscovered`, report its first
    /// `ClimateStateChanged`, and start whatever keeps that state current.
    ///
    /// Entities are not routable until their discovery has been sent.
    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), Box<dyn Error + Send>>;

    /// Execute a climate command.
    ///
    /// The command's reply, when present, must be answered exactly once:
    /// `Ok(())` once the device accepted the command, or the error message
    /// the API shows the caller. Dropping it unanswered reads as the
    /// integration being unavailable. Returning `Err` only logs.
    async fn handle_message(
        &mut self,
        msg: ToIntegrationMessage,
    ) -> Result<(), Box<dyn Error + Send>>;

    /// Stop background work started in `setup`.
    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>>;
}

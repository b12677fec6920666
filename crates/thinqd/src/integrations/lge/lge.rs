use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::DOMAIN;
use super::LgeConfig;
use super::climate::LgeAcClimate;
use super::device::LgeDevice;
use crate::climate::ClimateEntity;
use crate::climate::snapshot;
use crate::engine::ClimateState;
use crate::engine::FromIntegrationMessage;
use crate::engine::FromIntegrationSender;
use crate::engine::Integration;
use crate::engine::ToIntegrationMessage;
use crate::thinq::AirConditionerDevice;
use crate::thinq::Device;
use crate::thinq::DeviceDescriptor;
use crate::thinq::ModelInfo;
use crate::thinq::ThinqClient;

/// Climate entities keyed by entity id. Fixed after construction.
type ClimatesMap = Arc<HashMap<String, Arc<LgeAcClimate>>>;

/// Last state reported to the engine per entity
type ReportedMap = Arc<Mutex<HashMap<String, ClimateState>>>;

/// LG ThinQ integration for thinqd
///
/// Exposes one climate entity per configured air conditioner, polls every
/// device on a fixed interval and reports state changes to the engine.
pub struct LgeIntegration {
    climates: ClimatesMap,
    scan_interval: Duration,
    reported: ReportedMap,
    to_engine: Option<FromIntegrationSender>,
    /// Handle to the background polling task
    _poll_task: Option<JoinHandle<()>>,
}

impl LgeIntegration {
    pub fn new(climates: Vec<(String, LgeAcClimate)>, scan_interval: Duration) -> Self {
        let climates = climates
            .into_iter()
            .map(|(entity_id, climate)| (entity_id, Arc::new(climate)))
            .collect();
        Self {
            climates: Arc::new(climates),
            scan_interval,
            reported: Arc::new(Mutex::new(HashMap::new())),
            to_engine: None,
            _poll_task: None,
        }
    }

    /// Build the integration from its configuration section.
    ///
    /// Each device's model info document is read here; a missing or malformed
    /// one fails the whole integration.
    pub fn from_config(client: Arc<dyn ThinqClient>, config: &LgeConfig) -> anyhow::Result<Self> {
        let mut climates = Vec::with_capacity(config.devices.len());
        for (key, dev) in &config.devices {
            let bytes = std::fs::read(&dev.model_info).with_context(|| {
                format!("Failed to read model info {}", dev.model_info.display())
            })?;
            let model_info = ModelInfo::from_slice(&bytes).with_context(|| {
                format!("Failed to parse model info {}", dev.model_info.display())
            })?;
            debug!(
                "Loaded {:?} model info for {} from {}",
                model_info.version(),
                dev.name,
                dev.model_info.display()
            );

            let device = Device::new(
                client.clone(),
                DeviceDescriptor {
                    device_id: dev.device_id.clone(),
                    name: dev.name.clone(),
                    model_name: dev.model.clone(),
                },
                Arc::new(model_info),
            );
            let api = LgeDevice::new(
                AirConditionerDevice::new(device),
                dev.model.clone(),
                dev.firmware.clone(),
            );
            climates.push((format!("climate.{}", key), LgeAcClimate::new(Arc::new(api))));
        }

        Ok(Self::new(climates, config.scan_interval()))
    }

    /// Poll every device on the scan interval
    async fn poll_task(
        climates: ClimatesMap,
        reported: ReportedMap,
        to_engine: FromIntegrationSender,
        scan_interval: Duration,
    ) {
        // setup() already did the initial refresh
        let start = tokio::time::Instant::now() + scan_interval;
        let mut interval = tokio::time::interval_at(start, scan_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            for (entity_id, climate) in climates.iter() {
                Self::refresh_static(entity_id, climate, &reported, &to_engine).await;
            }
        }
    }

    /// Poll the entity's device and report its state if it changed
    async fn refresh_static(
        entity_id: &str,
        climate: &LgeAcClimate,
        reported: &ReportedMap,
        to_engine: &FromIntegrationSender,
    ) {
        let _guard = climate.device().refresh_guard().await;
        climate.device().update().await;
        let state = snapshot(climate);

        {
            let mut reported = reported.lock().await;
            if reported.get(entity_id) == Some(&state) {
                return;
            }
            reported.insert(entity_id.to_string(), state.clone());
        }

        let msg = FromIntegrationMessage::ClimateStateChanged {
            entity_id: entity_id.to_string(),
            state,
        };
        if let Err(e) = to_engine.send(msg).await {
            warn!("Failed to send ClimateStateChanged message: {}", e);
        }
    }

    /// Register an entity with the engine
    async fn register_entity(
        entity_id: &str,
        climate: &LgeAcClimate,
        to_engine: &FromIntegrationSender,
    ) {
        let msg = FromIntegrationMessage::EntityDiscovered {
            entity_id: entity_id.to_string(),
            integration_name: DOMAIN.to_string(),
            device: climate.device_info(),
        };
        if let Err(e) = to_engine.send(msg).await {
            warn!("Failed to send EntityDiscovered message: {}", e);
        } else {
            info!("Registered entity: {} ({})", entity_id, climate.name());
        }
    }
}

#[async_trait]
impl Integration for LgeIntegration {
    fn name(&self) -> &str {
        DOMAIN
    }

    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), Box<dyn Error + Send>> {
        self.to_engine = Some(tx.clone());

        if self.climates.is_empty() {
            warn!("LG integration has no devices configured");
        }

        for (entity_id, climate) in self.climates.iter() {
            Self::register_entity(entity_id, climate, &tx).await;
            Self::refresh_static(entity_id, climate, &self.reported, &tx).await;
        }

        info!(
            "LG integration set up with {} device(s), polling every {:?}",
            self.climates.len(),
            self.scan_interval
        );

        let climates = self.climates.clone();
        let reported = self.reported.clone();
        let scan_interval = self.scan_interval;
        let task = tokio::spawn(async move {
            Self::poll_task(climates, reported, tx, scan_interval).await;
        });
        self._poll_task = Some(task);

        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: ToIntegrationMessage,
    ) -> Result<(), Box<dyn Error + Send>> {
        match msg {
            ToIntegrationMessage::ClimateCommand {
                entity_id,
                command,
                reply,
            } => {
                let Some(climate) = self.climates.get(&entity_id).cloned() else {
                    let message = format!("Climate entity not found: {}", entity_id);
                    if let Some(reply) = reply {
                        reply.send(Err(message.clone())).ok();
                    }
                    return Err(Box::new(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        message,
                    )));
                };

                info!("Handling climate command for {}: {:?}", entity_id, command);
                let result = command.execute(climate.as_ref()).await;

                if let Some(reply) = reply {
                    reply
                        .send(result.as_ref().map_err(ToString::to_string).copied())
                        .ok();
                }

                if let Some(to_engine) = &self.to_engine {
                    Self::refresh_static(&entity_id, &climate, &self.reported, to_engine).await;
                }

                result.map_err(|e| -> Box<dyn Error + Send> { Box::new(e) })
            }
        }
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>> {
        info!("LG integration shutting down");
        if let Some(task) = self._poll_task.take() {
            task.abort();
        }
        Ok(())
    }
}

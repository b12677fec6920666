mod climate;
mod config;
mod device;
#[cfg(feature = "thinq_http")]
mod http;
#[allow(clippy::module_inception)]
mod lge;

use std::sync::Arc;

pub use climate::LgeAcClimate;
pub use config::Config as LgeConfig;
pub use device::LgeDevice;
use linkme::distributed_slice;
pub use lge::LgeIntegration;
use tracing::info;

use crate::engine;
use crate::thinq::ThinqClient;

/// Integration domain, used for the integration name and device identifiers.
pub const DOMAIN: &str = "lge";

#[cfg(feature = "thinq_http")]
fn build_client(config: &LgeConfig) -> anyhow::Result<Arc<dyn ThinqClient>> {
    use anyhow::Context;

    let client = http::HttpClient::new(config).context("Failed to create ThinQ client")?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "thinq_http"))]
fn build_client(_config: &LgeConfig) -> anyhow::Result<Arc<dyn ThinqClient>> {
    anyhow::bail!("thinqd was built without the thinq_http feature")
}

#[distributed_slice(engine::INTEGRATION_REGISTRY)]
fn init_lge(ctx: &engine::IntegrationContext) -> engine::IntegrationFactoryResult {
    let lge_config = match &ctx.config.integrations.lge {
        Some(c) if c.enabled => c,
        Some(_) => {
            info!("LG integration disabled in configuration");
            return Ok(None);
        }
        None => return Ok(None),
    };

    let client = build_client(lge_config)?;
    Ok(Some(Box::new(LgeIntegration::from_config(client, lge_config)?)))
}

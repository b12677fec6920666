use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use thinqd::Config;
use thinqd::Engine;

/// Bridge LG ThinQ air conditioners into a climate control API
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "thinqd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(config.logging.env_filter()?)
        .init();

    tracing::info!("thinqd starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let mut engine = Engine::new();
    engine.register_integrations_from_config(&config);
    let engine = Arc::new(engine);

    let runner = engine.clone();
    let engine_handle = tokio::spawn(async move {
        if let Err(e) = runner.run().await {
            tracing::error!("Engine stopped with error: {}", e);
        }
    });

    let api = config.api.clone().map(|api| {
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let engine = engine.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = thinqd::api::serve(api.listen, api.port, engine, shutdown_rx).await {
                tracing::error!("HTTP API server failed: {:#}", e);
            }
        });
        (shutdown_tx, handle)
    });
    if api.is_none() {
        tracing::info!("HTTP API disabled");
    }

    tracing::info!("Press Ctrl+C to exit");

    // Wait for Ctrl+C
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received shutdown signal");
        }
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    if let Some((shutdown_tx, handle)) = api {
        shutdown_tx.send(()).ok();
        handle.await.ok();
    }
    engine_handle.abort();

    tracing::info!("thinqd shutdown complete");

    Ok(())
}

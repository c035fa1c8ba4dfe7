// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use dara_node::{
    api::{serve, AppState},
    config::DaraConfig,
    orchestrator::Detector,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DaraConfig::from_env();
    config.validate().context("Invalid configuration")?;
    let default_language = config.language()?;

    info!(
        vlm_endpoint = %config.inference.vlm_endpoint,
        vlm_model = %config.inference.vlm_model,
        cache_enabled = config.cache.enabled,
        translation = config.translation.endpoint.is_some(),
        tts = config.tts.enabled,
        "Starting DARA node"
    );

    let detector = Arc::new(Detector::from_config(&config)?);
    let state = AppState::new(Arc::clone(&detector), default_language);

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
    };

    serve(state, config.api_port, shutdown)
        .await
        .context("API server failed")?;

    match detector.persist() {
        Ok(saved) => info!(saved, "Result cache saved"),
        Err(e) => warn!("Failed to save result cache: {}", e),
    }

    info!("DARA node stopped");
    Ok(())
}

//! Edge Scorer - forecast-driven node scoring service
//!
//! This binary runs next to the scheduler, scoring candidate edge nodes
//! for pending pods from each node's predicted utilization.

use anyhow::{Context, Result};
use edge_scorer::{api, config::ScorerConfig};
use scorer_lib::{
    health::components, CancellationToken, ForecastClient, HealthRegistry, ScorerMetrics,
    ScoringEngine, StructuredLogger, PLUGIN_NAME,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SCORER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting edge-scorer");

    let config = ScorerConfig::load()?;
    info!(
        api_port = config.api_port,
        targets = config.targets.len(),
        normalizer = ?config.normalizer,
        "Scorer configured"
    );

    let client = ForecastClient::new(&config.targets, config.forecast_client_config())
        .context("Failed to build forecast client")?;

    let metrics = ScorerMetrics::new();
    metrics.set_targets_configured(client.target_count() as i64);

    let logger = StructuredLogger::new(PLUGIN_NAME);
    logger.log_targets_loaded(client.target_count());
    let engine = ScoringEngine::new(config.scoring, Arc::new(client))
        .context("Failed to build scoring engine")?;
    logger.log_startup(
        SCORER_VERSION,
        config.scoring.alpha,
        config.scoring.theta1,
        config.scoring.theta2,
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::FORECAST_SOURCE).await;

    let shutdown = CancellationToken::new();
    let app_state = Arc::new(api::AppState::new(
        Arc::new(engine),
        config.normalizer.build(),
        config.targets.clone(),
        health_registry.clone(),
        shutdown.clone(),
    ));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    health_registry.set_ready(false).await;
    shutdown.cancel();

    api_handle.await??;
    info!("Shut down");

    Ok(())
}

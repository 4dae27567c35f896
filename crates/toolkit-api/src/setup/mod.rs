//! Application setup and initialization

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use toolkit_core::Config;

use crate::state::AppState;

/// Validate the configuration, install tracing, and build the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format)
        .context("Failed to initialize telemetry")?;

    tracing::info!(environment = %config.environment, "Configuration loaded and validated successfully");

    build_app(config)
}

/// Build state and router without touching the global tracing subscriber.
pub fn build_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let state = Arc::new(AppState::new(&config)?);
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

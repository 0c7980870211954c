// =============================================================================
// KUB Signals — Main Entry Point
// =============================================================================
//
// Serves the analysis tools over HTTP.  Configuration comes from the JSON
// file named by `KUB_CONFIG` (default `kub_config.json`); `KUB_BIND_ADDR`
// overrides the listen address.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kub_signals::api;
use kub_signals::app_state::AppState;
use kub_signals::runtime_config::{RuntimeConfig, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("KUB Signals starting up");

    let config_path =
        PathBuf::from(std::env::var("KUB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into()));

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    if let Ok(addr) = std::env::var("KUB_BIND_ADDR") {
        let addr = addr.trim();
        if !addr.is_empty() {
            config.bind_addr = addr.to_string();
        }
    }
    let bind_addr = config.bind_addr.clone();

    // ── 2. Shared state & router ─────────────────────────────────────────
    let state = Arc::new(AppState::new(config, Some(config_path)));
    let app = api::router(state.clone());

    // ── 3. Serve until Ctrl-C ────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, tools = api::TOOLS.len(), "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!(calls_served = state.calls_served(), uptime_secs = state.uptime_secs(), "Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, stopping gracefully");
}

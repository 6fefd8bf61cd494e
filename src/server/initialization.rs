// src/server/initialization.rs

//! Handles relay initialization: resolving the RCON profile, building the
//! shared state, and binding the HTTP listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::ledger::ResponseLedger;
use crate::core::profile;
use crate::core::session::{SessionManager, SessionOptions};
use crate::core::state::RelayState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::info;

/// Initializes all relay components before starting the main loop.
///
/// An invalid or missing RCON profile is fatal here: the relay never serves
/// requests without a complete session target.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let resolved = profile::resolve(&config.config_dir).with_context(|| {
        format!(
            "Failed to load RCON profile from '{}'",
            config.config_dir.display()
        )
    })?;

    let ledger = Arc::new(ResponseLedger::new(config.ledger.capacity));
    let session = Arc::new(SessionManager::new(
        resolved.params,
        SessionOptions::from(&config.session),
        ledger.clone(),
    ));
    let state = Arc::new(RelayState::new(config.clone(), session.clone(), ledger));
    info!("Relay state initialized.");

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    info!("[rconnect-server] Server started on port {}.", config.port);

    Ok(ServerContext {
        state,
        session,
        listener: Some(listener),
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    info!(
        "Using configuration directory '{}'.",
        config.config_dir.display()
    );
    if config.reconnect.enabled {
        info!(
            "RCON reconnect enabled (initial delay {:?}, max delay {:?}, max attempts {}).",
            config.reconnect.initial_delay, config.reconnect.max_delay, config.reconnect.max_attempts
        );
    } else {
        info!("RCON reconnect disabled.");
    }
}

// src/server/spawner.rs

//! Spawns the relay's long-running background tasks.

use super::context::ServerContext;
use super::http;
use crate::core::tasks::reconnect::SessionSupervisor;
use anyhow::{Context, Result};
use tracing::info;

/// Spawns all background tasks into the context's JoinSet.
pub fn spawn_all(ctx: &mut ServerContext) -> Result<()> {
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    // --- Session supervisor ---
    let supervisor = SessionSupervisor::new(
        ctx.session.clone(),
        ctx.state.config.reconnect.clone(),
    );
    let shutdown_rx_session = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        supervisor.run(shutdown_rx_session).await;
        Ok(())
    });

    // --- HTTP server ---
    let listener = ctx
        .listener
        .take()
        .context("HTTP listener was already handed to the server task")?;
    let http_state = ctx.state.clone();
    let shutdown_rx_http = shutdown_tx.subscribe();
    background_tasks.spawn(async move { http::serve(listener, http_state, shutdown_rx_http).await });

    info!("All background tasks have been spawned.");
    Ok(())
}

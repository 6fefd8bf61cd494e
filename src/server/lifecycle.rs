// src/server/lifecycle.rs

//! Waits for a shutdown trigger and then winds the relay down gracefully.

use super::context::ServerContext;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

/// How long background tasks get to finish after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Runs until SIGINT, SIGTERM, or the failure of a background task.
pub async fn run(mut ctx: ServerContext) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;

    let mut failure = None;
    tokio::select! {
        biased;

        _ = sigint.recv() => {
            info!("SIGINT received, initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received, initiating graceful shutdown.");
        }
        Some(res) = ctx.background_tasks.join_next() => {
            match res {
                Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                Ok(Err(e)) => {
                    error!("CRITICAL: Background task failed: {}. Shutting down.", e);
                    failure = Some(e);
                }
                Err(e) => {
                    error!("CRITICAL: Background task panicked: {e:?}. Shutting down.");
                    failure = Some(anyhow::anyhow!("background task panicked: {e}"));
                }
            }
        }
    }

    shutdown(&mut ctx).await;
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Broadcasts shutdown, closes the RCON session, and waits for tasks to drain.
pub async fn shutdown(ctx: &mut ServerContext) {
    info!("Shutting down. Sending signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        warn!("No task was listening for the shutdown signal.");
    }

    ctx.session.close().await;

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(SHUTDOWN_GRACE, async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
        ctx.background_tasks.shutdown().await;
    }
    info!("Relay shutdown complete.");
}

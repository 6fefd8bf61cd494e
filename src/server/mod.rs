// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod context;
pub mod http;
mod initialization;
mod lifecycle;
mod spawner;

pub use context::ServerContext;

/// The main relay startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Resolve the RCON profile, build shared state, bind the listener.
    let mut server_context = initialization::setup(config).await?;

    // 2. Spawn the session supervisor and the HTTP server.
    spawner::spawn_all(&mut server_context)?;

    // 3. Run until a shutdown signal or a task failure.
    lifecycle::run(server_context).await
}

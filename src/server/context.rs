// src/server/context.rs

use crate::core::session::SessionManager;
use crate::core::state::RelayState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Holds all the initialized state required to run the relay's main loop.
pub struct ServerContext {
    pub state: Arc<RelayState>,
    /// The concrete session behind `state.session`, needed for lifecycle control.
    pub session: Arc<SessionManager>,
    /// Taken by the spawner when the HTTP server task starts.
    pub listener: Option<TcpListener>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub background_tasks: JoinSet<Result<(), anyhow::Error>>,
}

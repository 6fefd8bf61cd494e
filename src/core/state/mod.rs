// src/core/state/mod.rs

//! Defines `RelayState`, the shared state handed to every request handler.

use crate::config::Config;
use crate::core::dispatcher::CommandDispatcher;
use crate::core::inventory::InventoryStore;
use crate::core::ledger::ResponseLedger;
use crate::core::session::RconSession;
use std::sync::Arc;

/// Everything a request handler may touch. Built once at startup and shared
/// behind an `Arc`; nothing here is a global.
pub struct RelayState {
    pub config: Config,
    /// The process's single RCON session.
    pub session: Arc<dyn RconSession>,
    pub dispatcher: CommandDispatcher,
    pub inventory: InventoryStore,
    pub ledger: Arc<ResponseLedger>,
}

impl RelayState {
    pub fn new(config: Config, session: Arc<dyn RconSession>, ledger: Arc<ResponseLedger>) -> Self {
        Self {
            config,
            dispatcher: CommandDispatcher::new(session.clone()),
            session,
            inventory: InventoryStore::new(),
            ledger,
        }
    }
}

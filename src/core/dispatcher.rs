// src/core/dispatcher.rs

//! Forwards command strings to the active session and hands back the
//! correlated response.

use crate::core::RelayError;
use crate::core::metrics;
use crate::core::protocol::Packet;
use crate::core::session::RconSession;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Sends commands through a shared session.
///
/// There is no queue and no retry: concurrent dispatches are independent and
/// may complete in any order, and a failure is reported once to its caller.
#[derive(Clone)]
pub struct CommandDispatcher {
    session: Arc<dyn RconSession>,
}

impl CommandDispatcher {
    pub fn new(session: Arc<dyn RconSession>) -> Self {
        Self { session }
    }

    /// Dispatches `command` and returns the response packet untouched.
    ///
    /// The command is trimmed first; an empty result fails with `EmptyCommand`
    /// before the session is consulted.
    pub async fn dispatch(&self, command: &str) -> Result<Packet, RelayError> {
        let command = normalize(command).ok_or(RelayError::EmptyCommand)?;

        if !self.session.is_authenticated() {
            metrics::COMMANDS_FAILED_TOTAL.inc();
            return Err(RelayError::NotAuthenticated);
        }

        let started = Instant::now();
        match self.session.send(command).await {
            Ok(packet) => {
                metrics::COMMANDS_DISPATCHED_TOTAL.inc();
                metrics::COMMAND_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());
                debug!("RCON command answered with request id {}", packet.id);
                Ok(packet)
            }
            Err(e) => {
                metrics::COMMANDS_FAILED_TOTAL.inc();
                warn!("RCON command failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Trims surrounding whitespace; `None` if nothing is left.
pub fn normalize(command: &str) -> Option<&str> {
    let trimmed = command.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

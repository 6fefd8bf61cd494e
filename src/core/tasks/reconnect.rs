// src/core/tasks/reconnect.rs

//! Keeps the RCON session up: makes the initial connection attempt and, if
//! enabled, re-establishes a failed or dropped session with exponential backoff.

use crate::config::ReconnectConfig;
use crate::core::metrics;
use crate::core::session::{RconSession, SessionManager};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Upper bound on the random delay added to each backoff.
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Background task owning the session's connection lifecycle.
pub struct SessionSupervisor {
    session: Arc<SessionManager>,
    policy: ReconnectConfig,
}

impl SessionSupervisor {
    pub fn new(session: Arc<SessionManager>, policy: ReconnectConfig) -> Self {
        Self { session, policy }
    }

    /// Runs until shutdown. Connection failures are logged, never propagated.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut state_rx = self.session.subscribe();

        tokio::select! {
            result = self.session.connect() => {
                if let Err(e) = result {
                    error!("Initial RCON connect failed: {}", e);
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Session supervisor shutting down.");
                return;
            }
        }

        if !self.policy.enabled {
            info!("RCON reconnect is disabled. The session will not be re-established if it goes down.");
            let _ = shutdown_rx.recv().await;
            info!("Session supervisor shutting down.");
            return;
        }

        let mut consecutive_failures: u32 = if self.session.is_authenticated() { 0 } else { 1 };
        let mut current_delay = self.policy.initial_delay;

        loop {
            let is_down = state_rx.borrow_and_update().is_down();
            if !is_down {
                tokio::select! {
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        continue;
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Session supervisor shutting down.");
                        return;
                    }
                }
            }

            if self.policy.max_attempts > 0 && consecutive_failures >= self.policy.max_attempts {
                error!(
                    "Giving up on the RCON server after {} consecutive failed attempts. Restart the relay to try again.",
                    consecutive_failures
                );
                let _ = shutdown_rx.recv().await;
                info!("Session supervisor shutting down.");
                return;
            }

            let jitter_cap = MAX_JITTER.min(current_delay).as_millis() as u64;
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_cap));
            let wait_time = current_delay + jitter;
            info!("Will try to reconnect to the RCON server in {wait_time:?}");

            tokio::select! {
                _ = tokio::time::sleep(wait_time) => {}
                _ = shutdown_rx.recv() => {
                    info!("Session supervisor shutting down during backoff.");
                    return;
                }
            }

            metrics::RECONNECT_ATTEMPTS_TOTAL.inc();
            let result = tokio::select! {
                result = self.session.connect() => result,
                _ = shutdown_rx.recv() => {
                    info!("Session supervisor shutting down.");
                    return;
                }
            };

            match result {
                Ok(()) => {
                    info!("RCON session re-established.");
                    consecutive_failures = 0;
                    current_delay = self.policy.initial_delay;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!("Reconnect attempt {} failed: {}", consecutive_failures, e);
                    current_delay = next_backoff(current_delay, self.policy.max_delay);
                }
            }
        }
    }
}

/// Doubles `current`, capped at `max`. Saturates instead of overflowing.
pub fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

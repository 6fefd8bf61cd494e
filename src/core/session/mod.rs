// src/core/session/mod.rs

//! The RCON session: the single, stateful, authenticated connection the relay
//! forwards commands through.

mod link;
mod manager;

pub use manager::{SessionManager, SessionOptions};

use crate::core::RelayError;
use crate::core::protocol::Packet;
use async_trait::async_trait;
use std::fmt;

/// Lifecycle state of the session.
///
/// ```text
/// Disconnected --connect()--> Connecting --tcp ok--> Connected --auth ok--> Authenticated
/// Connecting/Connected --failure--> Failed
/// Authenticated --socket error/close--> Disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Authenticated,
    /// The last connection attempt failed.
    Failed,
}

impl SessionState {
    /// Numeric form used by the `rconnect_session_state` gauge.
    pub fn as_gauge(self) -> f64 {
        match self {
            SessionState::Disconnected => 0.0,
            SessionState::Connecting => 1.0,
            SessionState::Connected => 2.0,
            SessionState::Authenticated => 3.0,
            SessionState::Failed => 4.0,
        }
    }

    /// True once the transport is up, whether or not login has completed.
    pub fn is_connected(self) -> bool {
        matches!(self, SessionState::Connected | SessionState::Authenticated)
    }

    /// True when the session is down and a new attempt may be made.
    pub fn is_down(self) -> bool {
        matches!(self, SessionState::Disconnected | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Authenticated => "authenticated",
            SessionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What the dispatcher and the HTTP layer need from a session.
///
/// `SessionManager` is the real implementation; tests substitute fakes.
#[async_trait]
pub trait RconSession: Send + Sync {
    /// The current lifecycle state.
    fn state(&self) -> SessionState;

    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Sends one command and waits for its correlated response packet.
    async fn send(&self, command: &str) -> Result<Packet, RelayError>;
}

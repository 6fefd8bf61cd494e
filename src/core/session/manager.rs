// src/core/session/manager.rs

//! Owns the relay's single RCON connection: connecting, authenticating,
//! tracking state, and sending commands over it.

use super::link::{Link, PacketReader, PacketWriter};
use super::{RconSession, SessionState};
use crate::core::RelayError;
use crate::core::ledger::ResponseLedger;
use crate::core::metrics;
use crate::core::profile::ConnectionParams;
use crate::core::protocol::{Packet, PacketType, RconCodec};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info, warn};

/// Id the server puts in an auth response to reject the password.
const AUTH_REJECTED_ID: i32 = -1;

/// Timeouts applied by the session's protocol client.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// How long a TCP connect may take.
    pub connect_timeout: Duration,
    /// How long to wait for the response to a request, including login.
    pub response_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(2),
        }
    }
}

/// State shared with the per-connection reader task.
#[derive(Debug)]
struct Shared {
    state_tx: watch::Sender<SessionState>,
    link: RwLock<Option<Arc<Link>>>,
    ledger: Arc<ResponseLedger>,
}

impl Shared {
    fn set_state(&self, state: SessionState) {
        self.state_tx.send_replace(state);
        metrics::SESSION_STATE.set(state.as_gauge());
    }

    fn current_link(&self) -> Option<Arc<Link>> {
        self.link.read().clone()
    }

    /// Called when `link`'s reader ends. A newer link is left untouched.
    fn detach(&self, link: &Arc<Link>) {
        let mut slot = self.link.write();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, link)) {
            *slot = None;
            drop(slot);
            self.set_state(SessionState::Disconnected);
            warn!("RCON connection closed.");
        }
    }
}

/// The one RCON session of the process.
///
/// The manager never reconnects on its own; `connect()` performs a single
/// attempt and a supervisor decides whether to call it again.
#[derive(Debug)]
pub struct SessionManager {
    params: ConnectionParams,
    options: SessionOptions,
    shared: Arc<Shared>,
    next_id: AtomicI32,
    /// Serializes connection attempts.
    connect_lock: Mutex<()>,
    /// Number of finished attempts, and the outcome of the latest one. Lets a
    /// caller that queued behind an attempt share its result.
    attempts: AtomicU64,
    last_outcome: parking_lot::Mutex<Option<Result<(), RelayError>>>,
}

impl SessionManager {
    pub fn new(
        params: ConnectionParams,
        options: SessionOptions,
        ledger: Arc<ResponseLedger>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            params,
            options,
            shared: Arc::new(Shared {
                state_tx,
                link: RwLock::new(None),
                ledger,
            }),
            next_id: AtomicI32::new(1),
            connect_lock: Mutex::new(()),
            attempts: AtomicU64::new(0),
            last_outcome: parking_lot::Mutex::new(None),
        }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Number of requests on the current connection still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.shared.current_link().map_or(0, |link| link.pending_len())
    }

    /// Makes one attempt to connect and authenticate.
    ///
    /// A failure leaves the session in `Failed` and is returned to the caller;
    /// it is never fatal to the process. Calling this while the session is
    /// already up returns `Ok(())` without touching the connection, and a call
    /// made while another attempt is running returns that attempt's outcome.
    pub async fn connect(&self) -> Result<(), RelayError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let _attempt = self.connect_lock.lock().await;
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(outcome) = self.last_outcome.lock().clone() {
                return outcome;
            }
        }
        if self.state().is_connected() {
            return Ok(());
        }

        let outcome = self.attempt().await;
        *self.last_outcome.lock() = Some(outcome.clone());
        self.attempts.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn attempt(&self) -> Result<(), RelayError> {
        self.shared.set_state(SessionState::Connecting);
        let addr = self.params.addr();
        info!("Connecting to RCON server at {}", addr);

        let stream =
            match tokio::time::timeout(self.options.connect_timeout, TcpStream::connect(&addr))
                .await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => return Err(self.fail(RelayError::ConnectFailed(e.to_string()))),
                Err(_) => {
                    return Err(self.fail(RelayError::ConnectFailed(format!(
                        "connect to {addr} timed out"
                    ))));
                }
            };
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY on RCON socket: {}", e);
        }

        self.shared.set_state(SessionState::Connected);
        info!("Connected with RCON server.");

        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, RconCodec);
        let mut writer = FramedWrite::new(write_half, RconCodec);

        let login = self.authenticate(&mut reader, &mut writer);
        match tokio::time::timeout(self.options.response_timeout, login).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(self.fail(e)),
            Err(_) => {
                return Err(self.fail(RelayError::ConnectFailed(
                    "timed out waiting for authentication".to_string(),
                )));
            }
        }

        let link = Arc::new(Link::new(writer));
        *self.shared.link.write() = Some(link.clone());
        self.shared.set_state(SessionState::Authenticated);
        info!("Authenticated with RCON server.");

        let shared = self.shared.clone();
        let task_link = link.clone();
        let handle = tokio::spawn(async move {
            task_link.pump(reader, &shared.ledger).await;
            shared.detach(&task_link);
        });
        link.set_reader_task(handle);
        Ok(())
    }

    /// Performs the login exchange on a freshly opened connection.
    async fn authenticate(
        &self,
        reader: &mut PacketReader,
        writer: &mut PacketWriter,
    ) -> Result<(), RelayError> {
        let id = self.next_request_id();
        writer
            .send(Packet::auth(id, &self.params.password))
            .await
            .map_err(|e| RelayError::ConnectFailed(e.to_string()))?;

        loop {
            let packet = match reader.next().await {
                Some(Ok(packet)) => packet,
                Some(Err(e)) => return Err(RelayError::ConnectFailed(e.to_string())),
                None => {
                    return Err(RelayError::ConnectFailed(
                        "connection closed during authentication".to_string(),
                    ));
                }
            };

            match packet.kind {
                PacketType::ExecOrAuthResponse if packet.id == AUTH_REJECTED_ID => {
                    return Err(RelayError::AuthenticationFailed);
                }
                PacketType::ExecOrAuthResponse => return Ok(()),
                // Some servers send an empty response value ahead of the auth response.
                _ => continue,
            }
        }
    }

    /// Tears down the connection, if any. Used on shutdown.
    pub async fn close(&self) {
        let link = self.shared.link.write().take();
        if let Some(link) = link {
            link.shutdown().await;
            self.shared.set_state(SessionState::Disconnected);
            info!("RCON session closed.");
        }
    }

    fn fail(&self, err: RelayError) -> RelayError {
        self.shared.set_state(SessionState::Failed);
        error!("Error connecting to RCON server: {}", err);
        err
    }

    /// Positive, wrapping request ids. `-1` is reserved by the protocol.
    fn next_request_id(&self) -> i32 {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id > 0 {
                return id;
            }
            // Wrapped into negatives; restart the sequence.
            let _ = self
                .next_id
                .compare_exchange(id.wrapping_add(1), 1, Ordering::Relaxed, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl RconSession for SessionManager {
    fn state(&self) -> SessionState {
        *self.shared.state_tx.borrow()
    }

    async fn send(&self, command: &str) -> Result<Packet, RelayError> {
        let link = match self.shared.current_link() {
            Some(link) if self.is_authenticated() => link,
            _ => return Err(RelayError::NotAuthenticated),
        };

        let packet = Packet::command(self.next_request_id(), command);
        let mut pending = link.submit(packet).await?;
        pending.wait(self.options.response_timeout).await
    }
}

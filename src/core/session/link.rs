// src/core/session/link.rs

//! One live, authenticated RCON connection: the write half, the table of
//! in-flight requests, and the reader loop that routes responses to them.

use crate::core::RelayError;
use crate::core::ledger::ResponseLedger;
use crate::core::protocol::{Packet, RconCodec};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, warn};

pub(super) type PacketReader = FramedRead<OwnedReadHalf, RconCodec>;
pub(super) type PacketWriter = FramedWrite<OwnedWriteHalf, RconCodec>;

type Waiter = oneshot::Sender<Result<Packet, RelayError>>;

#[derive(Debug)]
pub(super) struct Link {
    /// Writes are serialized so packets never interleave on the wire.
    writer: AsyncMutex<PacketWriter>,
    /// Waiters keyed by request id. Each dispatch owns exactly one entry.
    pending: DashMap<i32, Waiter>,
    /// Set once the reader has stopped; no new waiter can be answered after that.
    closed: AtomicBool,
    reader_task: Mutex<Option<JoinHandle<()>>>,
}

/// A request whose response has not arrived yet.
///
/// Dropping it removes the waiter from the link, so a caller that gives up
/// (timeout, or its future being dropped) never leaves an entry behind.
pub(super) struct PendingResponse<'a> {
    link: &'a Link,
    id: i32,
    rx: oneshot::Receiver<Result<Packet, RelayError>>,
}

impl PendingResponse<'_> {
    /// Waits up to `timeout` for the correlated response.
    pub(super) async fn wait(&mut self, timeout: Duration) -> Result<Packet, RelayError> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(result)) => result,
            // The reader dropped the waiter without answering.
            Ok(Err(_)) => Err(RelayError::ConnectionClosed),
            Err(_) => Err(RelayError::ResponseTimeout),
        }
    }
}

impl Drop for PendingResponse<'_> {
    fn drop(&mut self) {
        self.link.forget(self.id);
    }
}

impl Link {
    pub(super) fn new(writer: PacketWriter) -> Self {
        Self {
            writer: AsyncMutex::new(writer),
            pending: DashMap::new(),
            closed: AtomicBool::new(false),
            reader_task: Mutex::new(None),
        }
    }

    pub(super) fn set_reader_task(&self, handle: JoinHandle<()>) {
        *self.reader_task.lock() = Some(handle);
    }

    /// Registers a waiter for `packet.id` and writes the packet.
    pub(super) async fn submit(&self, packet: Packet) -> Result<PendingResponse<'_>, RelayError> {
        let id = packet.id;
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        let pending = PendingResponse { link: self, id, rx };

        // Checked after the insert: once `closed` is set, `fail_pending` either
        // saw this waiter or this check sees the flag.
        if self.is_closed() {
            return Err(RelayError::ConnectionClosed);
        }

        self.writer.lock().await.send(packet).await?;
        Ok(pending)
    }

    pub(super) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(super) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops the waiter for `id`, used when its caller stops waiting.
    pub(super) fn forget(&self, id: i32) {
        self.pending.remove(&id);
    }

    /// Reads packets until the connection ends, routing each to its waiter and
    /// recording it in the ledger.
    pub(super) async fn pump(&self, mut reader: PacketReader, ledger: &ResponseLedger) {
        while let Some(frame) = reader.next().await {
            match frame {
                Ok(packet) => {
                    ledger.record(packet.id, packet.clone());
                    match self.pending.remove(&packet.id) {
                        Some((_, waiter)) => {
                            // The caller may have timed out already.
                            let _ = waiter.send(Ok(packet));
                        }
                        None => debug!("Unsolicited RCON packet with id {}", packet.id),
                    }
                }
                Err(e) => {
                    warn!("RCON read error: {}", e);
                    break;
                }
            }
        }
        self.closed.store(true, Ordering::SeqCst);
        self.fail_pending();
    }

    /// Fails every in-flight request with `ConnectionClosed`.
    pub(super) fn fail_pending(&self) {
        let ids: Vec<i32> = self.pending.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, waiter)) = self.pending.remove(&id) {
                let _ = waiter.send(Err(RelayError::ConnectionClosed));
            }
        }
    }

    /// Stops the reader and closes the write half.
    pub(super) async fn shutdown(&self) {
        if let Some(handle) = self.reader_task.lock().take() {
            handle.abort();
        }
        self.closed.store(true, Ordering::SeqCst);
        if let Err(e) = self.writer.lock().await.close().await {
            debug!("Error while closing RCON connection: {}", e);
        }
        self.fail_pending();
    }
}

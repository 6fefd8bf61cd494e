// src/core/ledger.rs

//! The response ledger: a passive, bounded record of every response packet
//! the session receives, keyed by the protocol request id.
//!
//! Nothing in the dispatch path reads it back. It exists as a debugging hook,
//! so it is bounded and evicts the least recently recorded id when full.

use crate::core::metrics;
use crate::core::protocol::Packet;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

#[derive(Debug)]
pub struct ResponseLedger {
    /// `None` when recording is disabled (capacity 0).
    entries: Mutex<Option<LruCache<i32, Packet>>>,
}

impl ResponseLedger {
    /// Creates a ledger holding at most `capacity` entries. `0` disables recording.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(NonZeroUsize::new(capacity).map(LruCache::new)),
        }
    }

    /// Records a response event. A repeated request id overwrites the previous packet.
    pub fn record(&self, request_id: i32, packet: Packet) {
        let mut guard = self.entries.lock();
        if let Some(cache) = guard.as_mut() {
            cache.put(request_id, packet);
            metrics::LEDGER_ENTRIES.set(cache.len() as f64);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if a response for `request_id` is currently held.
    pub fn contains(&self, request_id: i32) -> bool {
        self.entries
            .lock()
            .as_ref()
            .is_some_and(|cache| cache.contains(&request_id))
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .lock()
            .as_ref()
            .map_or(0, |cache| cache.cap().get())
    }
}

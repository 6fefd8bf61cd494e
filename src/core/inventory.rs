// src/core/inventory.rs

//! An in-memory scratch store of inventories (arrays of strings), indexed by a
//! sequential id starting at 0.

use crate::core::RelayError;
use crate::core::metrics;
use parking_lot::RwLock;
use std::sync::Arc;

/// One stored inventory.
pub type Inventory = Vec<String>;

/// Append-only store; the id of an inventory is its position.
#[derive(Debug, Default)]
pub struct InventoryStore {
    items: RwLock<Vec<Arc<Inventory>>>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `inventory` and returns its id.
    ///
    /// Ids are assigned under the write lock, so concurrent appends still get a
    /// gapless, strictly increasing sequence.
    pub fn append(&self, inventory: Inventory) -> u64 {
        let mut items = self.items.write();
        let id = items.len() as u64;
        items.push(Arc::new(inventory));
        metrics::INVENTORIES_STORED.set(items.len() as f64);
        id
    }

    /// Returns the inventory stored under `id`, or `None` if no such id was assigned.
    pub fn get(&self, id: u64) -> Option<Arc<Inventory>> {
        let index = usize::try_from(id).ok()?;
        self.items.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

/// Parses an untrusted inventory payload: a JSON array of strings.
///
/// Anything else (invalid JSON, another JSON type, non-string elements, or a
/// payload over `max_bytes`) is a `MalformedPayload` error.
pub fn parse_payload(raw: &str, max_bytes: usize) -> Result<Inventory, RelayError> {
    if raw.len() > max_bytes {
        return Err(RelayError::MalformedPayload(format!(
            "payload exceeds {max_bytes} bytes"
        )));
    }
    let inventory: Inventory = serde_json::from_str(raw)?;
    Ok(inventory)
}

// src/core/mod.rs

//! The central module containing the relay's core logic and data structures.

pub mod dispatcher;
pub mod errors;
pub mod inventory;
pub mod ledger;
pub mod metrics;
pub mod profile;
pub mod protocol;
pub mod rconfig;
pub mod session;
pub mod state;
pub mod tasks;

pub use errors::{ErrorKind, RelayError};
pub use protocol::Packet;

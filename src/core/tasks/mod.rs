// src/core/tasks/mod.rs

//! Long-running background tasks that support the relay.

pub mod reconnect;

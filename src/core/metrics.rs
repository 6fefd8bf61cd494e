// src/core/metrics.rs

//! Defines and registers Prometheus metrics for relay monitoring.
//!
//! This module uses `lazy_static` so metrics are registered once in the
//! global registry for the life of the process.

use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, Histogram, TextEncoder, register_counter, register_gauge, register_histogram,
};

lazy_static! {
    // --- Gauges ---
    /// The session state as a number: 0 disconnected, 1 connecting, 2 connected,
    /// 3 authenticated, 4 failed.
    pub static ref SESSION_STATE: Gauge =
        register_gauge!("rconnect_session_state", "Current RCON session state (0=disconnected, 1=connecting, 2=connected, 3=authenticated, 4=failed).").unwrap();
    /// Entries currently held by the response ledger.
    pub static ref LEDGER_ENTRIES: Gauge =
        register_gauge!("rconnect_ledger_entries", "Number of response events held by the ledger.").unwrap();
    /// Inventories stored in the scratch store.
    pub static ref INVENTORIES_STORED: Gauge =
        register_gauge!("rconnect_inventories_stored", "Number of inventories held by the scratch store.").unwrap();

    // --- Counters ---
    /// Commands that returned a response.
    pub static ref COMMANDS_DISPATCHED_TOTAL: Counter =
        register_counter!("rconnect_commands_dispatched_total", "Total number of commands answered by the RCON server.").unwrap();
    /// Commands that failed to send or receive.
    pub static ref COMMANDS_FAILED_TOTAL: Counter =
        register_counter!("rconnect_commands_failed_total", "Total number of commands that failed.").unwrap();
    /// Connection attempts made by the reconnect supervisor after the first one.
    pub static ref RECONNECT_ATTEMPTS_TOTAL: Counter =
        register_counter!("rconnect_reconnect_attempts_total", "Total number of RCON reconnect attempts.").unwrap();

    // --- Histograms ---
    /// Round-trip time of dispatched commands.
    pub static ref COMMAND_DURATION_SECONDS: Histogram =
        register_histogram!("rconnect_command_duration_seconds", "Round-trip time of RCON commands in seconds.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

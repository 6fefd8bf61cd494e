// src/core/errors.rs

//! Defines the primary error type for the relay and its stable error kinds.

use std::sync::Arc;
use thiserror::Error;

/// The coarse, machine-checkable category of a `RelayError`.
///
/// Kinds are what crosses the HTTP boundary; the variant detail stays internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing configuration at startup. Fatal.
    Config,
    /// The session failed to connect or authenticate. Non-fatal.
    Connection,
    /// A single command failed to send or receive a response.
    Dispatch,
    /// A required request field was missing or empty.
    Validation,
    /// Structured input on the inventory path could not be parsed.
    MalformedPayload,
    /// A lookup found nothing.
    NotFound,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// The stable string form of this kind, used in error responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Connection => "connection",
            ErrorKind::Dispatch => "dispatch",
            ErrorKind::Validation => "validation",
            ErrorKind::MalformedPayload => "malformed_payload",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

/// The main error enum, representing all failures inside the relay core.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    // --- Configuration ---
    #[error("Missing required configuration key '{0}'")]
    MissingConfigKey(String),

    #[error("Invalid RCON port in config: '{0}'")]
    InvalidPort(String),

    #[error("Failed to read configuration file '{path}': {reason}")]
    ConfigRead { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration input is not valid UTF-8 text")]
    NonTextualConfig,

    // --- Connection ---
    #[error("Failed to connect to RCON server: {0}")]
    ConnectFailed(String),

    #[error("RCON authentication failed")]
    AuthenticationFailed,

    // --- Dispatch ---
    #[error("Command is empty")]
    EmptyCommand,

    #[error("RCON session is not authenticated")]
    NotAuthenticated,

    #[error("RCON connection closed")]
    ConnectionClosed,

    #[error("Timed out waiting for RCON response")]
    ResponseTimeout,

    #[error("Command exceeds the maximum RCON body length of {0} bytes")]
    CommandTooLong(usize),

    #[error("RCON protocol error: {0}")]
    Protocol(String),

    // --- Request validation ---
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Classifies this error into its stable `ErrorKind`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::MissingConfigKey(_)
            | RelayError::InvalidPort(_)
            | RelayError::ConfigRead { .. }
            | RelayError::InvalidConfig(_)
            | RelayError::NonTextualConfig => ErrorKind::Config,

            RelayError::ConnectFailed(_) | RelayError::AuthenticationFailed => {
                ErrorKind::Connection
            }

            RelayError::EmptyCommand | RelayError::MissingField(_) | RelayError::InvalidField { .. } => {
                ErrorKind::Validation
            }

            RelayError::Io(_)
            | RelayError::IncompleteData
            | RelayError::NotAuthenticated
            | RelayError::ConnectionClosed
            | RelayError::ResponseTimeout
            | RelayError::CommandTooLong(_)
            | RelayError::Protocol(_) => ErrorKind::Dispatch,

            RelayError::MalformedPayload(_) => ErrorKind::MalformedPayload,
            RelayError::NotFound(_) => ErrorKind::NotFound,
            RelayError::Internal(_) => ErrorKind::Internal,
        }
    }
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
impl Clone for RelayError {
    fn clone(&self) -> Self {
        match self {
            RelayError::Io(e) => RelayError::Io(Arc::clone(e)),
            RelayError::IncompleteData => RelayError::IncompleteData,
            RelayError::MissingConfigKey(k) => RelayError::MissingConfigKey(k.clone()),
            RelayError::InvalidPort(p) => RelayError::InvalidPort(p.clone()),
            RelayError::ConfigRead { path, reason } => RelayError::ConfigRead {
                path: path.clone(),
                reason: reason.clone(),
            },
            RelayError::InvalidConfig(s) => RelayError::InvalidConfig(s.clone()),
            RelayError::NonTextualConfig => RelayError::NonTextualConfig,
            RelayError::ConnectFailed(s) => RelayError::ConnectFailed(s.clone()),
            RelayError::AuthenticationFailed => RelayError::AuthenticationFailed,
            RelayError::EmptyCommand => RelayError::EmptyCommand,
            RelayError::NotAuthenticated => RelayError::NotAuthenticated,
            RelayError::ConnectionClosed => RelayError::ConnectionClosed,
            RelayError::ResponseTimeout => RelayError::ResponseTimeout,
            RelayError::CommandTooLong(n) => RelayError::CommandTooLong(*n),
            RelayError::Protocol(s) => RelayError::Protocol(s.clone()),
            RelayError::MissingField(f) => RelayError::MissingField(f),
            RelayError::InvalidField { field, reason } => RelayError::InvalidField {
                field,
                reason: reason.clone(),
            },
            RelayError::MalformedPayload(s) => RelayError::MalformedPayload(s.clone()),
            RelayError::NotFound(what) => RelayError::NotFound(what),
            RelayError::Internal(s) => RelayError::Internal(s.clone()),
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::MalformedPayload(e.to_string())
    }
}

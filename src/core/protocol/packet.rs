// src/core/protocol/packet.rs

//! Defines the RCON packet, the unit exchanged with the remote console.

use bytes::Bytes;

/// The numeric packet type field of the RCON protocol.
///
/// The value `2` is shared by `ExecCommand` (client to server) and
/// `AuthResponse` (server to client); the direction decides the meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// `SERVERDATA_AUTH`: a login request carrying the password.
    Auth,
    /// `SERVERDATA_EXECCOMMAND` / `SERVERDATA_AUTH_RESPONSE`.
    ExecOrAuthResponse,
    /// `SERVERDATA_RESPONSE_VALUE`: command output.
    ResponseValue,
    /// Any other value seen on the wire.
    Unknown(i32),
}

impl PacketType {
    pub fn as_i32(self) -> i32 {
        match self {
            PacketType::Auth => 3,
            PacketType::ExecOrAuthResponse => 2,
            PacketType::ResponseValue => 0,
            PacketType::Unknown(v) => v,
        }
    }
}

impl From<i32> for PacketType {
    fn from(v: i32) -> Self {
        match v {
            3 => PacketType::Auth,
            2 => PacketType::ExecOrAuthResponse,
            0 => PacketType::ResponseValue,
            other => PacketType::Unknown(other),
        }
    }
}

/// A single RCON packet. The body is kept as raw bytes and is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: PacketType,
    pub body: Bytes,
}

impl Packet {
    pub fn new(id: i32, kind: PacketType, body: impl Into<Bytes>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    /// A login request.
    pub fn auth(id: i32, password: &str) -> Self {
        Self::new(id, PacketType::Auth, Bytes::copy_from_slice(password.as_bytes()))
    }

    /// A command execution request.
    pub fn command(id: i32, command: &str) -> Self {
        Self::new(
            id,
            PacketType::ExecOrAuthResponse,
            Bytes::copy_from_slice(command.as_bytes()),
        )
    }

    /// The body decoded as text, replacing invalid UTF-8 sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

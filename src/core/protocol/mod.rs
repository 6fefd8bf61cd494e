// src/core/protocol/mod.rs

pub mod codec;
pub mod packet;
pub use codec::{MAX_BODY_LEN, MAX_PACKET_LEN, RconCodec};
pub use packet::{Packet, PacketType};

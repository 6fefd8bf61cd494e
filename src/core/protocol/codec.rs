// src/core/protocol/codec.rs

//! Implements the `Encoder` and `Decoder` for RCON packets.
//!
//! Wire layout, all integers little-endian:
//!
//! ```text
//! | size: i32 | id: i32 | type: i32 | body .. | 0x00 | 0x00 |
//! ```
//!
//! `size` counts every byte after itself, so the smallest packet has size 10.

use super::packet::{Packet, PacketType};
use crate::core::RelayError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Bytes of `id` + `type` + the two trailing NULs.
const HEADER_AND_TERMINATORS: usize = 10;
const SIZE_FIELD_LEN: usize = 4;

/// Upper bound on an incoming packet's `size` field.
pub const MAX_PACKET_LEN: usize = 64 * 1024;
/// Upper bound on an outgoing body; larger commands are refused before hitting the wire.
pub const MAX_BODY_LEN: usize = 4096;

/// A `tokio_util::codec` implementation for RCON packets.
#[derive(Debug, Default, Clone, Copy)]
pub struct RconCodec;

impl Encoder<Packet> for RconCodec {
    type Error = RelayError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.body.len() > MAX_BODY_LEN {
            return Err(RelayError::CommandTooLong(MAX_BODY_LEN));
        }

        let size = item.body.len() + HEADER_AND_TERMINATORS;
        dst.reserve(SIZE_FIELD_LEN + size);
        dst.put_i32_le(size as i32);
        dst.put_i32_le(item.id);
        dst.put_i32_le(item.kind.as_i32());
        dst.extend_from_slice(&item.body);
        dst.put_u8(0);
        dst.put_u8(0);
        Ok(())
    }
}

impl Decoder for RconCodec {
    type Item = Packet;
    type Error = RelayError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < SIZE_FIELD_LEN {
            return Ok(None);
        }

        let size = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        if size < HEADER_AND_TERMINATORS as i32 || size as usize > MAX_PACKET_LEN {
            return Err(RelayError::Protocol(format!("invalid packet size {size}")));
        }
        let size = size as usize;

        if src.len() < SIZE_FIELD_LEN + size {
            src.reserve(SIZE_FIELD_LEN + size - src.len());
            return Ok(None);
        }

        src.advance(SIZE_FIELD_LEN);
        let mut frame = src.split_to(size);
        let id = frame.get_i32_le();
        let kind = PacketType::from(frame.get_i32_le());

        let body_len = size - HEADER_AND_TERMINATORS;
        if frame[body_len..] != [0, 0] {
            return Err(RelayError::Protocol(
                "packet is missing its NUL terminators".to_string(),
            ));
        }
        let body: Bytes = frame.split_to(body_len).freeze();

        Ok(Some(Packet { id, kind, body }))
    }
}

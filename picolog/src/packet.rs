// Copyright 2025 The Pigweed Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

//! The fixed-size record that travels from a producer through the queue to
//! the wire: a call-site identifier plus at most four payload bytes.

use picolog_status::Result;
use picolog_stream::{Cursor, Write, WriteIntegerLe};

/// Maximum number of payload bytes carried by one packet.
pub const MAX_PAYLOAD: usize = 4;

/// Raw call-site identifier as it travels on the wire, little-endian.
#[cfg(not(feature = "narrow-id"))]
pub type RawId = u16;
/// Raw call-site identifier as it travels on the wire.
#[cfg(feature = "narrow-id")]
pub type RawId = u8;

/// Number of bytes an identifier occupies in a packet body.
pub const ID_SIZE: usize = core::mem::size_of::<RawId>();

/// Maximum number of arguments a single log invocation may carry.
#[cfg(not(feature = "narrow-id"))]
pub const MAX_ARGS: usize = 8;
/// Maximum number of arguments a single log invocation may carry.
#[cfg(feature = "narrow-id")]
pub const MAX_ARGS: usize = 4;

/// Number of distinct call sites an image may contain.
#[cfg(not(feature = "narrow-id"))]
pub const MAX_SITES: usize = 0x7ff8;
/// Number of distinct call sites an image may contain.
#[cfg(feature = "narrow-id")]
pub const MAX_SITES: usize = 0xff;

/// Reserved identifier of the synthetic overrun packet.
#[cfg(not(feature = "narrow-id"))]
pub const OVERRUN_ID: RawId = 0x7fff;
/// Reserved identifier of the synthetic overrun packet.
#[cfg(feature = "narrow-id")]
pub const OVERRUN_ID: RawId = 0xff;

/// Reserved identifier of the start-of-stream packet.
#[cfg(not(feature = "narrow-id"))]
pub const START_ID: RawId = 0x7ffe;

/// High bit of a 16-bit identifier, marking packets beyond the first of a
/// multi-packet logical record.
#[cfg(not(feature = "narrow-id"))]
pub const CONTINUATION_FLAG: RawId = 0x8000;

/// Marks `id` as a continuation of an in-flight logical record.
///
/// With 8-bit identifiers there is no continuation bit; the host re-joins
/// packets purely by identifier and stream order.
#[cfg(not(feature = "narrow-id"))]
pub const fn with_continuation(id: RawId) -> RawId {
    id | CONTINUATION_FLAG
}
/// Marks `id` as a continuation of an in-flight logical record.
#[cfg(feature = "narrow-id")]
pub const fn with_continuation(id: RawId) -> RawId {
    id
}

/// One queue slot: identifier plus up to [`MAX_PAYLOAD`] payload bytes.
///
/// `len` counts the identifier bytes plus the meaningful payload bytes, so
/// it is also the length of the serialized packet body before framing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Packet {
    len: u8,
    id: RawId,
    data: [u8; MAX_PAYLOAD],
}

impl Packet {
    /// An unused queue slot.
    pub const EMPTY: Packet = Packet {
        len: 0,
        id: 0,
        data: [0; MAX_PAYLOAD],
    };

    /// Builds a packet from an identifier and a payload of at most
    /// [`MAX_PAYLOAD`] bytes.  Excess payload bytes are truncated; the
    /// producer paths never construct one that long.
    pub fn new(id: RawId, payload: &[u8]) -> Self {
        let mut packet = Self::EMPTY;
        packet.set(id, payload);
        packet
    }

    /// Fills a (reserved) slot in place.
    pub fn set(&mut self, id: RawId, payload: &[u8]) {
        let len = payload.len().min(MAX_PAYLOAD);
        self.id = id;
        self.len = (ID_SIZE + len) as u8;
        self.data[..len].copy_from_slice(&payload[..len]);
    }

    /// The call-site identifier, including a possible continuation flag.
    pub fn id(&self) -> RawId {
        self.id
    }

    /// The meaningful payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..(self.len as usize).saturating_sub(ID_SIZE)]
    }

    /// Length of the serialized body: identifier plus payload.
    pub fn body_len(&self) -> usize {
        self.len as usize
    }

    /// Serializes the packet body (little-endian identifier first, then the
    /// payload) into `out`, returning the number of bytes written.
    pub fn write_body(&self, out: &mut [u8]) -> Result<usize> {
        let mut cursor = Cursor::new(out);
        #[cfg(not(feature = "narrow-id"))]
        cursor.write_u16_le(self.id)?;
        #[cfg(feature = "narrow-id")]
        cursor.write_u8_le(self.id)?;
        cursor.write_all(self.payload())?;
        Ok(cursor.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_packet_has_zero_length() {
        assert_eq!(Packet::EMPTY.body_len(), 0);
    }

    #[test]
    fn packet_reports_id_and_payload() {
        let packet = Packet::new(0x12, &[10, 20]);
        assert_eq!(packet.id(), 0x12);
        assert_eq!(packet.payload(), &[10, 20]);
        assert_eq!(packet.body_len(), ID_SIZE + 2);
    }

    #[cfg(not(feature = "narrow-id"))]
    #[test]
    fn body_serializes_id_little_endian_first() {
        let packet = Packet::new(0x0102, &[0xaa, 0xbb, 0xcc]);
        let mut body = [0u8; ID_SIZE + MAX_PAYLOAD];
        let len = packet.write_body(&mut body).unwrap();
        assert_eq!(&body[..len], &[0x02, 0x01, 0xaa, 0xbb, 0xcc]);
    }

    #[cfg(not(feature = "narrow-id"))]
    #[test]
    fn continuation_sets_high_bit_of_wide_id() {
        let id = with_continuation(0x0005);
        assert_eq!(id, 0x8005);
        let packet = Packet::new(id, &[1]);
        let mut body = [0u8; ID_SIZE + MAX_PAYLOAD];
        let len = packet.write_body(&mut body).unwrap();
        assert_eq!(&body[..len], &[0x05, 0x80, 1]);
    }

    #[cfg(feature = "narrow-id")]
    #[test]
    fn body_serializes_single_id_byte_first() {
        let packet = Packet::new(0x42, &[0xaa]);
        let mut body = [0u8; ID_SIZE + MAX_PAYLOAD];
        let len = packet.write_body(&mut body).unwrap();
        assert_eq!(&body[..len], &[0x42, 0xaa]);
    }

    #[test]
    fn body_write_to_short_buffer_fails() {
        let packet = Packet::new(1, &[1, 2, 3, 4]);
        let mut body = [0u8; 2];
        assert!(packet.write_body(&mut body).is_err());
    }
}

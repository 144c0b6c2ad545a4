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

//! Argument type tags and runtime value encoding.
//!
//! The set of argument types a call site may use is fixed and small: every
//! scalar fits in four little-endian bytes, and strings travel as chains of
//! four-byte chunks.  The type of each argument is established at compile
//! time by the logging macro and packed into the call site's 32-bit type
//! code; at runtime only the value bytes are moved.

use picolog_status::{Error, Result};
use picolog_stream::{Cursor, WriteIntegerLe};

use crate::packet::MAX_PAYLOAD;

/// Longest string payload transmitted before truncation, in bytes.
pub const MAX_STRING_LENGTH: usize = 16;

/// Four-bit tag identifying one argument's representation.
///
/// Tag *i* of a call site occupies bits `4*i..4*i + 4` of the type code, so
/// up to eight arguments pack into a `u32`.  The values are shared with the
/// host decoder and must not be renumbered.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeTag {
    /// No argument in this position.
    None = 0,
    /// Unsigned 8-bit integer, one payload byte.
    U8 = 1,
    /// Signed 8-bit integer, one payload byte.
    S8 = 2,
    /// Boolean, one payload byte (0 or 1).
    Bool = 3,
    /// Unsigned 16-bit integer, two payload bytes.
    U16 = 4,
    /// Signed 16-bit integer, two payload bytes.
    S16 = 5,
    /// 16-bit pointer, two payload bytes.
    Ptr16 = 6,
    /// Unsigned 32-bit integer, four payload bytes.
    U32 = 7,
    /// Signed 32-bit integer, four payload bytes.
    S32 = 8,
    /// IEEE-754 single-precision float, four payload bytes.
    F32 = 9,
    /// String, a chain of four-byte chunks with an interior NUL terminator.
    Str = 10,
}

impl TypeTag {
    /// The tag's contribution to a type code when it describes argument
    /// `index`.  Used by generated code to build the interned constant.
    pub const fn at(self, index: usize) -> u32 {
        (self as u32) << (4 * index)
    }

    /// Reconstructs a tag from one nibble of a type code.
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0 => Some(Self::None),
            1 => Some(Self::U8),
            2 => Some(Self::S8),
            3 => Some(Self::Bool),
            4 => Some(Self::U16),
            5 => Some(Self::S16),
            6 => Some(Self::Ptr16),
            7 => Some(Self::U32),
            8 => Some(Self::S32),
            9 => Some(Self::F32),
            10 => Some(Self::Str),
            _ => None,
        }
    }

    /// The tag describing argument `index` of a packed type code.
    pub const fn of_code(code: u32, index: usize) -> Option<Self> {
        Self::from_nibble(((code >> (4 * index)) & 0xf) as u8)
    }
}

/// A runtime log argument, produced by generated call-site code.
#[derive(Clone, Copy, Debug)]
pub enum Argument<'a> {
    /// Boolean.
    Bool(bool),
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Signed 8-bit integer.
    S8(i8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Signed 16-bit integer.
    S16(i16),
    /// 16-bit pointer, pre-narrowed by the call site.
    Ptr16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Signed 32-bit integer.
    S32(i32),
    /// Single-precision float (doubles are narrowed at the call site).
    F32(f32),
    /// String, transmitted as a continuation chain.
    Str(&'a str),
}

impl Argument<'_> {
    /// Writes the little-endian payload of a scalar argument.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` - the argument is a string; strings are
    ///   chunked through [`str_chunks`] instead.
    pub(crate) fn encode_scalar(&self, cursor: &mut Cursor<&mut [u8]>) -> Result<()> {
        match *self {
            Argument::Bool(v) => cursor.write_u8_le(v as u8),
            Argument::U8(v) => cursor.write_u8_le(v),
            Argument::S8(v) => cursor.write_u8_le(v as u8),
            Argument::U16(v) => cursor.write_u16_le(v),
            Argument::S16(v) => cursor.write_u16_le(v as u16),
            Argument::Ptr16(v) => cursor.write_u16_le(v),
            Argument::U32(v) => cursor.write_u32_le(v),
            Argument::S32(v) => cursor.write_u32_le(v as u32),
            Argument::F32(v) => cursor.write_f32_le(v),
            Argument::Str(_) => Err(Error::InvalidArgument),
        }
    }
}

/// One transmitted chunk of a string argument: up to four bytes.
pub(crate) type StrChunk = ([u8; MAX_PAYLOAD], usize);

/// Splits a string into the four-byte packet payloads that transmit it.
///
/// The final chunk carries a NUL terminator; when the string content ends
/// exactly on a chunk boundary a lone-NUL chunk follows.  Strings longer
/// than [`MAX_STRING_LENGTH`] are cut there and finished with an `...`
/// ellipsis chunk so the stream stays bounded.
pub(crate) fn str_chunks(value: &str) -> StrChunkIter<'_> {
    StrChunkIter {
        bytes: value.as_bytes(),
        offset: 0,
        done: false,
    }
}

/// Iterator returned by [`str_chunks`].
pub(crate) struct StrChunkIter<'a> {
    bytes: &'a [u8],
    offset: usize,
    done: bool,
}

impl Iterator for StrChunkIter<'_> {
    type Item = StrChunk;

    fn next(&mut self) -> Option<StrChunk> {
        if self.done {
            return None;
        }

        let mut chunk = [0u8; MAX_PAYLOAD];

        if self.offset >= MAX_STRING_LENGTH && self.offset < self.bytes.len() {
            // Truncated: replace the rest with an ellipsis terminator.
            chunk[..3].copy_from_slice(b"...");
            self.done = true;
            return Some((chunk, MAX_PAYLOAD));
        }

        let remaining = &self.bytes[self.offset..];
        let take = remaining.len().min(MAX_PAYLOAD);
        chunk[..take].copy_from_slice(&remaining[..take]);
        self.offset += take;

        if take < MAX_PAYLOAD {
            // The implicit NUL already sits after the content bytes.  A
            // string ending exactly on a chunk boundary reaches this arm on
            // the following call with `take == 0`, yielding a lone NUL.
            self.done = true;
            return Some((chunk, take + 1));
        }

        Some((chunk, MAX_PAYLOAD))
    }
}

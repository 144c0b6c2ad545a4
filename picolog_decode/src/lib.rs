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

//! Host-side reference decoder for `picolog` streams.
//!
//! Walks a captured byte stream back to structured log entries: frames are
//! split on the sentinel and unstuffed, packet bodies are parsed into
//! identifiers and payloads, continuation chains are re-joined into
//! logical records, and the [`Detokenizer`] resolves records against the
//! interned metadata table to reproduce severities, locations, argument
//! values and rendered lines.
//!
//! The production host tool reads the metadata section out of the image
//! file; here the table is walked in-process through
//! [`picolog::SiteTable`], which sees exactly the same records.  This is
//! the decoder the integration tests use to establish the round-trip
//! properties of the wire format.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

use picolog::codec::SENTINEL;
use picolog::{site_id, CallSite, Severity, SiteTable, TypeTag};
use picolog_stream::{Cursor, ReadIntegerLe};

/// Reserved 16-bit identifier of the start-of-stream packet.
const START_ID_U16: u16 = 0x7ffe;
/// Reserved overrun identifiers per id width.
const OVERRUN_ID_U16: u16 = 0x7fff;
const OVERRUN_ID_U8: u16 = 0xff;
/// Continuation flag of a 16-bit identifier.
const CONTINUATION_FLAG_U16: u16 = 0x8000;

/// Identifier width of the stream being decoded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdWidth {
    /// One-byte identifiers: 255 sites, no continuation flag.
    U8,
    /// Two-byte little-endian identifiers with a continuation flag.
    U16,
}

impl IdWidth {
    /// The width the linked `picolog` build emits.
    pub const fn native() -> Self {
        if picolog::ID_SIZE == 2 {
            Self::U16
        } else {
            Self::U8
        }
    }
}

/// Why a stream could not be decoded.
#[derive(Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// A frame's stuffing codes ran past its end.
    TruncatedFrame,
    /// A packet body was shorter than its identifier.
    TruncatedPacket,
    /// A record had fewer chunks than its type code requires.
    TruncatedRecord,
    /// A continuation packet arrived with no open record to join.
    OrphanContinuation(u16),
    /// A record referenced an identifier missing from the metadata table.
    UnknownSite(u16),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedFrame => write!(f, "frame stuffing codes run past the frame end"),
            Self::TruncatedPacket => write!(f, "packet body shorter than its identifier"),
            Self::TruncatedRecord => write!(f, "record is missing argument payload packets"),
            Self::OrphanContinuation(id) => {
                write!(f, "continuation packet for id {id:#06x} with no open record")
            }
            Self::UnknownSite(id) => {
                write!(f, "no metadata record for call-site id {id:#06x}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// One parsed packet as it appeared on the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WirePacket {
    /// Base call-site identifier (continuation flag stripped).
    pub id: u16,
    /// Whether the continuation flag was set.
    pub continuation: bool,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

/// A logical record: one packet per argument or string chunk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogRecord {
    /// Call-site identifier shared by all the record's packets.
    pub id: u16,
    /// Payloads in packet order.
    pub chunks: Vec<Vec<u8>>,
}

/// One re-joined stream element.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Start-of-stream marker (16-bit streams only).
    Start,
    /// Overrun report: the number of packets dropped, saturating at 255.
    Overrun(u8),
    /// A user log record.
    Record(LogRecord),
}

/// A decoded argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
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
    /// 16-bit pointer.
    Ptr16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Signed 32-bit integer.
    S32(i32),
    /// Single-precision float.
    F32(f32),
    /// String (possibly `...`-truncated by the producer).
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::S8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::S16(v) => write!(f, "{v}"),
            Self::Ptr16(v) => write!(f, "{v:#06x}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::S32(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

/// A fully decoded log entry.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedLog {
    /// Call-site identifier.
    pub id: u16,
    /// Interned severity.
    pub severity: Severity,
    /// Interned source path.
    pub file: String,
    /// Interned source line.
    pub line: u32,
    /// Interned format string.
    pub format: String,
    /// Decoded argument values, in call order.
    pub values: Vec<Value>,
    /// The rendered human-readable line.
    pub message: String,
}

/// A decoded stream element.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    /// Start-of-stream marker.
    Start,
    /// Overrun report with the dropped-packet count.
    Overrun(u8),
    /// A decoded log entry.
    Log(DecodedLog),
}

/// Splits a byte stream on the sentinel and unstuffs each frame.
///
/// Empty frames (back-to-back sentinels, idle filler) are ignored; a
/// trailing partial frame is ignored as still in flight.
pub fn deframe(stream: &[u8]) -> Result<Vec<Vec<u8>>, DecodeError> {
    let mut frames = Vec::new();
    let mut split = stream.split(|&byte| byte == SENTINEL);
    // Everything after the last sentinel has not been terminated yet.
    let trailing = split.next_back();
    debug_assert!(trailing.is_some());
    for segment in split {
        if !segment.is_empty() {
            frames.push(unstuff(segment)?);
        }
    }
    Ok(frames)
}

// Reverses the byte stuffing of one frame (sentinel terminator already
// stripped): read a code byte, copy `code - 1` literal bytes, and emit a
// sentinel between groups unless the code was 0xff.
fn unstuff(segment: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut body = Vec::new();
    let mut index = 0;
    while index < segment.len() {
        let code = segment[index] as usize;
        let end = index + code;
        if code == 0 || end > segment.len() {
            return Err(DecodeError::TruncatedFrame);
        }
        body.extend_from_slice(&segment[index + 1..end]);
        index = end;
        if index < segment.len() && code != 0xff {
            body.push(SENTINEL);
        }
    }
    Ok(body)
}

/// Parses one unstuffed packet body.
pub fn parse_packet(body: &[u8], width: IdWidth) -> Result<WirePacket, DecodeError> {
    match width {
        IdWidth::U8 => {
            let (&id, payload) = body.split_first().ok_or(DecodeError::TruncatedPacket)?;
            Ok(WirePacket {
                id: id as u16,
                continuation: false,
                payload: payload.to_vec(),
            })
        }
        IdWidth::U16 => {
            if body.len() < 2 {
                return Err(DecodeError::TruncatedPacket);
            }
            let raw = u16::from_le_bytes([body[0], body[1]]);
            Ok(WirePacket {
                id: raw & !CONTINUATION_FLAG_U16,
                continuation: raw & CONTINUATION_FLAG_U16 != 0,
                payload: body[2..].to_vec(),
            })
        }
    }
}

/// Deframes and parses a whole captured stream.
pub fn parse_stream(stream: &[u8], width: IdWidth) -> Result<Vec<WirePacket>, DecodeError> {
    deframe(stream)?
        .iter()
        .map(|body| parse_packet(body, width))
        .collect()
}

/// Re-joins packets into stream events.
///
/// Continuation packets append to the most recent open record with the
/// same base identifier.  With 8-bit identifiers there is no flag;
/// consecutive packets with the same identifier are joined instead.
pub fn group_records(packets: &[WirePacket], width: IdWidth) -> Result<Vec<Event>, DecodeError> {
    let mut events: Vec<Event> = Vec::new();
    // Base id -> index in `events` of the record a continuation extends.
    let mut open: HashMap<u16, usize> = HashMap::new();

    for packet in packets {
        if width == IdWidth::U16 && packet.id == START_ID_U16 && !packet.continuation {
            events.push(Event::Start);
            continue;
        }
        let overrun_id = match width {
            IdWidth::U8 => OVERRUN_ID_U8,
            IdWidth::U16 => OVERRUN_ID_U16,
        };
        if packet.id == overrun_id && !packet.continuation {
            let count = packet.payload.first().copied().unwrap_or(0);
            events.push(Event::Overrun(count));
            continue;
        }

        let join = if width == IdWidth::U16 {
            packet.continuation
        } else {
            // Heuristic join for flagless streams.
            matches!(events.last(), Some(Event::Record(record)) if record.id == packet.id)
        };

        if join {
            let index = *open
                .get(&packet.id)
                .ok_or(DecodeError::OrphanContinuation(packet.id))?;
            if let Event::Record(record) = &mut events[index] {
                record.chunks.push(packet.payload.clone());
            }
        } else {
            open.insert(packet.id, events.len());
            events.push(Event::Record(LogRecord {
                id: packet.id,
                chunks: vec![packet.payload.clone()],
            }));
        }
    }

    Ok(events)
}

/// Resolves re-joined records against the interned metadata table.
pub struct Detokenizer {
    sites: HashMap<u16, &'static CallSite>,
}

impl Detokenizer {
    /// Builds a detokenizer from the metadata table linked into this
    /// process, the same table a host tool reads out of the image.
    pub fn from_image() -> Self {
        Self {
            sites: SiteTable::iter()
                .map(|record| (site_id(record) as u16, record))
                .collect(),
        }
    }

    /// Number of metadata records in the table.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the metadata table is empty.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// The metadata record for `id`, if interned.
    pub fn site(&self, id: u16) -> Option<&'static CallSite> {
        self.sites.get(&id).copied()
    }

    /// Decodes a whole captured stream into entries.
    pub fn decode_stream(&self, stream: &[u8], width: IdWidth) -> Result<Vec<Entry>, DecodeError> {
        let packets = parse_stream(stream, width)?;
        group_records(&packets, width)?
            .into_iter()
            .map(|event| match event {
                Event::Start => Ok(Entry::Start),
                Event::Overrun(count) => Ok(Entry::Overrun(count)),
                Event::Record(record) => self.decode_record(&record).map(Entry::Log),
            })
            .collect()
    }

    /// Decodes one logical record against its metadata.
    pub fn decode_record(&self, record: &LogRecord) -> Result<DecodedLog, DecodeError> {
        let site = self
            .site(record.id)
            .ok_or(DecodeError::UnknownSite(record.id))?;

        let values = decode_values(site.typecode(), &record.chunks)?;
        let message = render(site.fmt(), &values);

        Ok(DecodedLog {
            id: record.id,
            severity: site.severity(),
            file: site.file().to_string(),
            line: site.line(),
            format: site.fmt().to_string(),
            values,
            message,
        })
    }
}

// Walks the packed type code, consuming one chunk per scalar argument and
// a NUL-terminated run of chunks per string argument.
fn decode_values(typecode: u32, chunks: &[Vec<u8>]) -> Result<Vec<Value>, DecodeError> {
    let mut values = Vec::new();
    let mut chunks = chunks.iter();

    for index in 0..8 {
        let Some(tag) = TypeTag::of_code(typecode, index) else {
            break;
        };
        if tag == TypeTag::None {
            break;
        }

        if tag == TypeTag::Str {
            let mut text = Vec::new();
            loop {
                let chunk = chunks.next().ok_or(DecodeError::TruncatedRecord)?;
                match chunk.iter().position(|&byte| byte == 0) {
                    Some(nul) => {
                        text.extend_from_slice(&chunk[..nul]);
                        break;
                    }
                    None => text.extend_from_slice(chunk),
                }
            }
            values.push(Value::Str(String::from_utf8_lossy(&text).into_owned()));
            continue;
        }

        let chunk = chunks.next().ok_or(DecodeError::TruncatedRecord)?;
        let mut cursor = Cursor::new(chunk.as_slice());
        let value = match tag {
            TypeTag::Bool => cursor.read_u8_le().map(|v| Value::Bool(v != 0)),
            TypeTag::U8 => cursor.read_u8_le().map(Value::U8),
            TypeTag::S8 => cursor.read_u8_le().map(|v| Value::S8(v as i8)),
            TypeTag::U16 => cursor.read_u16_le().map(Value::U16),
            TypeTag::S16 => cursor.read_u16_le().map(|v| Value::S16(v as i16)),
            TypeTag::Ptr16 => cursor.read_u16_le().map(Value::Ptr16),
            TypeTag::U32 => cursor.read_u32_le().map(Value::U32),
            TypeTag::S32 => cursor.read_u32_le().map(|v| Value::S32(v as i32)),
            TypeTag::F32 => cursor.read_f32_le().map(Value::F32),
            TypeTag::None | TypeTag::Str => unreachable!("handled above"),
        };
        values.push(value.map_err(|_| DecodeError::TruncatedRecord)?);
    }

    Ok(values)
}

// Substitutes placeholder values into the interned format string.  Display
// specs inside the braces are host policy; the reference implementation
// ignores them.  Leftover values (formats with no placeholders) are
// appended, matching the bare "label plus values" calling style.
fn render(format: &str, values: &[Value]) -> String {
    let mut message = String::new();
    let mut remaining = values.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                message.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                message.push('}');
            }
            '{' => {
                for spec in chars.by_ref() {
                    if spec == '}' {
                        break;
                    }
                }
                match remaining.next() {
                    Some(value) => {
                        let _ = write!(message, "{value}");
                    }
                    None => message.push_str("{?}"),
                }
            }
            _ => message.push(c),
        }
    }

    for value in remaining {
        let _ = write!(message, " {value}");
    }
    message
}

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

//! `picolog_stream` provides `no_std` byte-stream primitives for the
//! `picolog` workspace: [`Read`] and [`Write`] traits, a simplified
//! in-memory [`Cursor`], and little-endian integer accessors sized for the
//! wire format (nothing wider than 32 bits travels in a log packet).
//! [`picolog_status::Error`] is used throughout to avoid error conversion
//! at the call sites.
//!
//! # Example
//!
//! ```
//! use picolog_stream::{Cursor, ReadIntegerLe, WriteIntegerLe};
//!
//! # fn doctest() -> picolog_status::Result<()> {
//! let mut buffer = [0u8; 8];
//! let mut cursor = Cursor::new(&mut buffer[..]);
//! cursor.write_u16_le(0x8005)?;
//! cursor.write_u32_le(0xdead_beef)?;
//! assert_eq!(cursor.position(), 6);
//!
//! let mut cursor = Cursor::new(&buffer[..]);
//! assert_eq!(cursor.read_u16_le()?, 0x8005);
//! assert_eq!(cursor.read_u32_le()?, 0xdead_beef);
//! # Ok(())
//! # }
//! # doctest().unwrap();
//! ```

#![deny(missing_docs)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

use core::cmp::min;

use picolog_status::{Error, Result};

/// A trait for objects that provide streaming read capability.
pub trait Read {
    /// Read from a stream into a buffer, returning the number of bytes read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Read exactly `buf.len()` bytes or fail with [`Error::OutOfRange`].
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.read(buf)? == buf.len() {
            Ok(())
        } else {
            Err(Error::OutOfRange)
        }
    }
}

/// A trait for objects that provide streaming write capability.
pub trait Write {
    /// Write a buffer to a stream, returning the number of bytes written.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Write the entire buffer or fail with [`Error::OutOfRange`].
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if self.write(buf)? == buf.len() {
            Ok(())
        } else {
            Err(Error::OutOfRange)
        }
    }
}

/// Little-endian integer reads for any [`Read`] implementation.
///
/// Only the widths that appear in the `picolog` wire format are provided.
pub trait ReadIntegerLe: Read {
    /// Reads a `u8`.
    fn read_u8_le(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Reads a little-endian `u16`.
    fn read_u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Reads a little-endian `u32`.
    fn read_u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Reads a little-endian IEEE-754 `f32`.
    fn read_f32_le(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32_le()?))
    }
}

impl<T: Read> ReadIntegerLe for T {}

/// Little-endian integer writes for any [`Write`] implementation.
///
/// Only the widths that appear in the `picolog` wire format are provided.
pub trait WriteIntegerLe: Write {
    /// Writes a `u8`.
    fn write_u8_le(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])
    }

    /// Writes a little-endian `u16`.
    fn write_u16_le(&mut self, value: u16) -> Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    /// Writes a little-endian `u32`.
    fn write_u32_le(&mut self, value: u32) -> Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    /// Writes a little-endian IEEE-754 `f32`.
    fn write_f32_le(&mut self, value: f32) -> Result<()> {
        self.write_u32_le(value.to_bits())
    }
}

impl<T: Write> WriteIntegerLe for T {}

/// Wraps an <code>[AsRef]<[u8]></code> in a container implementing
/// [`Read`] and, when the inner type also implements
/// <code>[AsMut]<[u8]></code>, [`Write`].
pub struct Cursor<T>
where
    T: AsRef<[u8]>,
{
    inner: T,
    pos: usize,
}

impl<T: AsRef<[u8]>> Cursor<T> {
    /// Create a new `Cursor` wrapping `inner` with an initial position of 0.
    pub fn new(inner: T) -> Self {
        Self { inner, pos: 0 }
    }

    /// Consumes the cursor and returns the inner wrapped data.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Returns the current byte position of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes between the position and the end.
    pub fn remaining(&self) -> usize {
        self.len() - self.pos
    }

    fn len(&self) -> usize {
        self.inner.as_ref().len()
    }
}

impl<T: AsRef<[u8]>> Read for Cursor<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read_len = min(self.remaining(), buf.len());
        buf[..read_len].copy_from_slice(&self.inner.as_ref()[self.pos..(self.pos + read_len)]);
        self.pos += read_len;
        Ok(read_len)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Write for Cursor<T> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let write_len = min(self.remaining(), buf.len());
        self.inner.as_mut()[self.pos..(self.pos + write_len)].copy_from_slice(&buf[0..write_len]);
        self.pos += write_len;
        Ok(write_len)
    }
}

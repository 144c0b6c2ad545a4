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

//! Byte-stuffing frame codec.
//!
//! Frames are delimited with a single [`SENTINEL`] byte which, by
//! construction, never appears inside an encoded frame body.  The body uses
//! consistent-overhead stuffing: a code byte holds the distance (1..=255)
//! to the next sentinel in the original data, or to the end of the frame.
//! Receivers that lose synchronization recover at the next sentinel, and
//! empty frames (back-to-back sentinels) are ignored as idle filler.

use picolog_status::{Error, Result};

/// Frame delimiter.  The value is part of the wire format shared with the
/// host and must never change.
pub const SENTINEL: u8 = 0xa6;

/// Worst-case encoded size for an input of `input_len` bytes.
///
/// One leading code byte plus one trailing sentinel; inputs short enough
/// for a log frame never require additional code bytes beyond those that
/// replace sentinels in place.
pub const fn max_encoded_len(input_len: usize) -> usize {
    input_len + 2
}

/// Encodes `input` into `output` as a single sentinel-terminated frame,
/// returning the encoded length.
///
/// # Errors
/// - `Error::OutOfRange` - `output` is too small for the encoded frame.
pub fn encode(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut code: u8 = 1;
    let mut code_index = 0;
    let mut write_index = 1;

    for &byte in input {
        if byte == SENTINEL {
            *output.get_mut(code_index).ok_or(Error::OutOfRange)? = code;
            code_index = write_index;
            write_index += 1;
            code = 1;
        } else {
            *output.get_mut(write_index).ok_or(Error::OutOfRange)? = byte;
            write_index += 1;
            code += 1;
            // A run of 254 sentinel-free bytes exhausts the code byte;
            // close it and open a new run.
            if code == 0xff {
                *output.get_mut(code_index).ok_or(Error::OutOfRange)? = code;
                code_index = write_index;
                write_index += 1;
                code = 1;
            }
        }
    }

    *output.get_mut(code_index).ok_or(Error::OutOfRange)? = code;
    *output.get_mut(write_index).ok_or(Error::OutOfRange)? = SENTINEL;
    Ok(write_index + 1)
}

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

//! # picolog_status
//!
//! Error and result types shared by the `picolog` workspace crates.  The
//! conditions a binary logging runtime can hit are few and local, so the
//! error enum stays deliberately small; log call sites themselves never
//! observe an error (logging is best-effort by contract).
//!
//! # Example
//!
//! ```
//! use picolog_status::{Error, Result};
//!
//! fn checked_fill(buffer: &mut [u8], value: u8) -> Result<()> {
//!     if buffer.is_empty() {
//!         return Err(Error::OutOfRange);
//!     }
//!     buffer.fill(value);
//!     Ok(())
//! }
//!
//! assert_eq!(checked_fill(&mut [], 0xab), Err(Error::OutOfRange));
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

/// Error conditions recognized by the `picolog` runtime and its tools.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The packet queue has no free slot; the record was dropped.
    QueueFull,

    /// The transport cannot accept a frame right now.
    TransportBusy,

    /// A buffer was too small for the requested operation.
    OutOfRange,

    /// A value outside the supported domain was provided.
    InvalidArgument,
}

/// `Result` alias used throughout the `picolog` workspace.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_compare_by_variant() {
        assert_eq!(Error::QueueFull, Error::QueueFull);
        assert_ne!(Error::QueueFull, Error::TransportBusy);
    }

    #[test]
    fn result_alias_round_trips() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(ok, Ok(7));

        let err: Result<u32> = Err(Error::OutOfRange);
        assert_eq!(err.unwrap_err(), Error::OutOfRange);
    }
}

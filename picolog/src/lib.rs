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

//! `picolog` - tokenized binary logging for memory-constrained targets.
//!
//! A log call site does no format work at runtime.  The format string,
//! source location, severity and argument type signature are interned at
//! compile time into a dedicated metadata section of the image; the
//! runtime ships only a compact binary record - a call-site identifier
//! plus at most four payload bytes per packet.  A host-side tool joins the
//! runtime stream against the metadata extracted from the image to
//! reconstruct human-readable lines.
//!
//! The enqueue path is safe to call from any context, including interrupt
//! handlers: no allocation, no locks, just a short critical section
//! provided by the platform [`Port`].  A single cooperative drain moves
//! one byte-stuffed frame per transport-ready tick to the sink.
//!
//! # Example
//!
//! ```
//! use picolog::{Logger, Port, RestoreState};
//!
//! // A port that discards frames; real targets bind a UART here.
//! struct NullPort;
//!
//! impl Port for NullPort {
//!     fn enter_critical_section(&self) -> RestoreState {
//!         RestoreState(0)
//!     }
//!     fn exit_critical_section(&self, _restore: RestoreState) {}
//!     fn notify(&self) {}
//!     fn tx_ready(&self) -> bool {
//!         true
//!     }
//!     fn send(&self, _frame: &[u8]) {}
//! }
//!
//! static PORT: NullPort = NullPort;
//! static LOGGER: Logger = Logger::new(&PORT);
//!
//! picolog::install(&LOGGER);
//! picolog::info!("Boot");
//! picolog::warn!("Position: ({},{})", 10u8, 20u8);
//! picolog::info!("Temperature: {}", 36.7 as f32);
//! LOGGER.flush();
//! ```
//!
//! Argument types must be explicit at the call site - a suffixed literal
//! (`10u8`), a cast (`x as u16`, `s as &str`), or a `bool`/string literal -
//! because the type signature is interned into the image while the value
//! travels as raw little-endian bytes.  Anything wider than four bytes per
//! packet is rejected at compile time.

#![deny(missing_docs)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod arg;
pub mod codec;
mod level;
mod logger;
mod packet;
pub mod port;
mod ring;
mod site;

pub use arg::{Argument, TypeTag, MAX_STRING_LENGTH};
pub use level::Severity;
pub use logger::{
    global, install, DrainStatus, Logger, DEFAULT_QUEUE_CAPACITY,
};
#[cfg(not(feature = "narrow-id"))]
pub use packet::{CONTINUATION_FLAG, START_ID};
pub use packet::{
    with_continuation, Packet, RawId, ID_SIZE, MAX_ARGS, MAX_PAYLOAD, MAX_SITES, OVERRUN_ID,
};
pub use port::{Port, RestoreState};
pub use ring::RingBuffer;
#[doc(hidden)]
pub use site::site_id;
pub use site::{CallSite, SiteTable, FILE_CAPACITY, FMT_CAPACITY};

#[doc(hidden)]
// Creating a __private namespace allows us a way to get to the items
// generated call-site code needs by doing:
//     use $crate::__private as __picolog_crate;
//
// This is how proc macro generated code can reliably reference back to
// `picolog` while still allowing a user to import it under a different
// name.
pub mod __private {
    pub use picolog_macro::_log;

    pub use crate::arg::{Argument, TypeTag};
    pub use crate::level::Severity;
    pub use crate::logger::dispatch;
    pub use crate::packet::MAX_ARGS;
    pub use crate::site::{site_id, CallSite};
}

/// Emit a log record at an explicit severity.
///
/// The severity is one of the bare identifiers `Error`, `Warn`, `Mile`,
/// `Info`, `Trace`, `Debug0`, `Debug1`, `Debug2` or `Debug3`, followed by
/// a literal format string and the arguments.  Expansion interns the
/// call-site metadata into the image and compiles to a handful of enqueue
/// calls; call sites below the `PICOLOG_LEVEL` build threshold vanish
/// entirely - no metadata, no code.
///
/// # Example
///
/// ```
/// picolog::log!(Info, "Battery: {} mV", 3276u16);
/// ```
#[macro_export]
macro_rules! log {
    ($severity:ident, $format_string:literal $(, $args:expr)* $(,)?) => {{
        use $crate::__private as __picolog_crate;
        __picolog_crate::_log!($severity, $format_string $(, $args)*)
    }};
}

/// Emit an error level log record.
///
/// # Example
///
/// ```
/// picolog::error!("Sensor fault: {}", 0x13u8);
/// ```
#[macro_export]
macro_rules! error {
    ($($args:tt)*) => {{
        $crate::log!(Error, $($args)*)
    }};
}

/// Emit a warn level log record.
#[macro_export]
macro_rules! warn {
    ($($args:tt)*) => {{
        $crate::log!(Warn, $($args)*)
    }};
}

/// Emit a milestone log record: rare, always-interesting lifecycle events.
#[macro_export]
macro_rules! mile {
    ($($args:tt)*) => {{
        $crate::log!(Mile, $($args)*)
    }};
}

/// Emit an info level log record.
///
/// # Example
///
/// ```
/// picolog::info!("Boot");
/// ```
#[macro_export]
macro_rules! info {
    ($($args:tt)*) => {{
        $crate::log!(Info, $($args)*)
    }};
}

/// Emit a trace level log record.
#[macro_export]
macro_rules! trace {
    ($($args:tt)*) => {{
        $crate::log!(Trace, $($args)*)
    }};
}

/// Emit a debug log record, least verbose debug tier.
#[macro_export]
macro_rules! debug0 {
    ($($args:tt)*) => {{
        $crate::log!(Debug0, $($args)*)
    }};
}

/// Emit a debug log record.
#[macro_export]
macro_rules! debug1 {
    ($($args:tt)*) => {{
        $crate::log!(Debug1, $($args)*)
    }};
}

/// Emit a debug log record.
#[macro_export]
macro_rules! debug2 {
    ($($args:tt)*) => {{
        $crate::log!(Debug2, $($args)*)
    }};
}

/// Emit a debug log record, most verbose debug tier.
#[macro_export]
macro_rules! debug3 {
    ($($args:tt)*) => {{
        $crate::log!(Debug3, $($args)*)
    }};
}

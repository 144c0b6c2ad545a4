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

//! The logger: queue, scratch buffer and drain engine behind one handle.
//!
//! Producers (any context, including interrupt handlers) enqueue packets;
//! a single cooperative drain moves one frame per invocation to the
//! transport.  Every shared access happens inside the port's critical
//! section, which only needs to suspend preemption over a few loads and
//! stores.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicPtr, Ordering};

use picolog_stream::Cursor;

use crate::arg::{str_chunks, Argument};
use crate::codec;
use crate::packet::{with_continuation, Packet, RawId, ID_SIZE, MAX_PAYLOAD};
use crate::port::Port;
use crate::ring::RingBuffer;

#[cfg(not(feature = "narrow-id"))]
use crate::packet::START_ID;
use crate::packet::OVERRUN_ID;

/// Queue capacity of the logger the logging macros target.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

// Worst case frame: identifier, full payload, stuffing overhead, sentinel.
const TX_SCRATCH_LEN: usize = codec::max_encoded_len(ID_SIZE + MAX_PAYLOAD);

/// Outcome of one [`Logger::drain_once`] invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DrainStatus {
    /// One frame was handed to the transport.
    Sent,
    /// Nothing left to send; the drain is idle.
    Empty,
    /// The transport was not ready; a completion or notify retries.
    Busy,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DrainState {
    Idle,
    Draining,
}

struct Shared<const N: usize> {
    ring: RingBuffer<N>,
    scratch: [u8; TX_SCRATCH_LEN],
    drain: DrainState,
}

/// A logging runtime instance: bounded packet queue, transmit scratch and
/// the cooperative drain state machine.
///
/// The logging macros go through the installed global instance (see
/// [`install`]); bespoke queue capacities can be driven directly through
/// the typed handle.
pub struct Logger<const N: usize = DEFAULT_QUEUE_CAPACITY> {
    port: &'static dyn Port,
    shared: UnsafeCell<Shared<N>>,
}

// SAFETY: `shared` is only touched inside `with_critical_section`, and the
// port contract makes those windows mutually exclusive across every
// context that can reach the logger (threads, interrupt handlers).
unsafe impl<const N: usize> Sync for Logger<N> {}

impl<const N: usize> Logger<N> {
    /// Creates a logger bound to `port`.
    pub const fn new(port: &'static dyn Port) -> Self {
        Self {
            port,
            shared: UnsafeCell::new(Shared {
                ring: RingBuffer::new(),
                scratch: [0; TX_SCRATCH_LEN],
                drain: DrainState::Idle,
            }),
        }
    }

    fn with_critical_section<R>(&self, f: impl FnOnce(&mut Shared<N>) -> R) -> R {
        let saved = self.port.enter_critical_section();
        // SAFETY: see the `Sync` impl; the critical section serializes
        // every path to `shared`.
        let result = f(unsafe { &mut *self.shared.get() });
        self.port.exit_critical_section(saved);
        result
    }

    /// Enqueues one packet, best effort.
    ///
    /// A full queue drops the packet and counts the loss; the caller never
    /// observes a failure.  The drain is notified on every attempt so bare
    /// "event happened" records are not stranded.
    pub fn enqueue(&self, id: RawId, payload: &[u8]) {
        self.with_critical_section(|shared| {
            if let Ok(slot) = shared.ring.reserve() {
                slot.set(id, payload);
            }
            self.port.notify();
        });
    }

    /// Enqueues the packets of one logical log record.
    ///
    /// Each argument becomes one packet; string arguments expand to their
    /// chunk chain.  Packets after the first carry the continuation flag
    /// (16-bit identifiers only), and all share `id`'s low bits so the
    /// host can re-join them by identifier and stream order.
    pub fn log_record(&self, id: RawId, args: &[Argument<'_>]) {
        if args.is_empty() {
            self.enqueue(id, &[]);
            return;
        }

        let mut first = true;
        for arg in args {
            match arg {
                Argument::Str(value) => {
                    for (chunk, len) in str_chunks(value) {
                        self.enqueue(self.record_id(id, first), &chunk[..len]);
                        first = false;
                    }
                }
                scalar => {
                    let mut payload = [0u8; MAX_PAYLOAD];
                    let mut cursor = Cursor::new(&mut payload[..]);
                    if scalar.encode_scalar(&mut cursor).is_ok() {
                        let len = cursor.position();
                        self.enqueue(self.record_id(id, first), &payload[..len]);
                        first = false;
                    }
                }
            }
        }
    }

    fn record_id(&self, id: RawId, first: bool) -> RawId {
        if first {
            id
        } else {
            with_continuation(id)
        }
    }

    /// Emits the start-of-stream packet.
    ///
    /// Called once at initialization, before any user log, so the host can
    /// resynchronize after a reconnect.
    #[cfg(not(feature = "narrow-id"))]
    pub fn start(&self) {
        self.enqueue(START_ID, &[]);
    }

    /// Moves at most one frame to the transport.
    ///
    /// Invoked from the port's send-complete path, the drain worker, or an
    /// idle hook.  Exactly one frame per invocation keeps the transport
    /// interlock trivial: the next frame moves when the port reports the
    /// previous one complete.
    pub fn drain_once(&self) -> DrainStatus {
        self.with_critical_section(|shared| {
            // The ready flag may clear right after this check, but then a
            // completion is in flight and will invoke the drain again.
            if !self.port.tx_ready() {
                return DrainStatus::Busy;
            }

            if let Some(packet) = shared.ring.dequeue() {
                shared.drain = DrainState::Draining;
                Self::transmit(self.port, &packet, &mut shared.scratch);
                return DrainStatus::Sent;
            }

            if shared.ring.overrun() != 0 {
                // Queue is drained; report the loss and unlatch producers.
                let dropped = shared.ring.clear_overrun();
                shared.drain = DrainState::Draining;
                Self::transmit(
                    self.port,
                    &Packet::new(OVERRUN_ID, &[dropped]),
                    &mut shared.scratch,
                );
                return DrainStatus::Sent;
            }

            shared.drain = DrainState::Idle;
            DrainStatus::Empty
        })
    }

    fn transmit(port: &dyn Port, packet: &Packet, scratch: &mut [u8; TX_SCRATCH_LEN]) {
        let mut body = [0u8; ID_SIZE + MAX_PAYLOAD];
        // The buffers are statically sized for the worst case; neither
        // write can fail.
        if let Ok(body_len) = packet.write_body(&mut body) {
            if let Ok(frame_len) = codec::encode(&body[..body_len], scratch) {
                port.send(&scratch[..frame_len]);
            }
        }
    }

    /// Drains until no more frames move.
    ///
    /// Not interrupt safe on its own; intended for shutdown and
    /// deterministic test sequencing, with a transport that stays ready.
    pub fn flush(&self) {
        while self.drain_once() == DrainStatus::Sent {}
    }

    /// Returns `true` when the drain last observed an empty queue with no
    /// pending overrun report.
    pub fn is_idle(&self) -> bool {
        self.with_critical_section(|shared| shared.drain == DrainState::Idle)
    }
}

// The macro-facing global instance, log-facade style: a thin pointer that
// is null until `install` runs.  Logging before installation is silently
// dropped, never an error.
static GLOBAL: AtomicPtr<Logger> = AtomicPtr::new(core::ptr::null_mut());

/// Makes `logger` the instance the logging macros target.
pub fn install(logger: &'static Logger) {
    GLOBAL.store(
        logger as *const Logger as *mut Logger,
        Ordering::Release,
    );
}

/// The installed global logger, if any.
pub fn global() -> Option<&'static Logger> {
    let ptr = GLOBAL.load(Ordering::Acquire);
    if ptr.is_null() {
        None
    } else {
        // SAFETY: the pointer was stored from a `&'static Logger`.
        Some(unsafe { &*ptr })
    }
}

// Called by generated call-site code.
#[doc(hidden)]
pub fn dispatch(id: RawId, args: &[Argument<'_>]) {
    if let Some(logger) = global() {
        logger.log_record(id, args);
    }
}

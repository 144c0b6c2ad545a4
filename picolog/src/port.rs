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

//! The platform binding: critical sections, drain scheduling and the byte
//! transport.
//!
//! One [`Port`] implementation binds the core to one platform.  On a
//! microcontroller the critical section saves and disables the interrupt
//! flag, `notify` schedules the drain from an idle hook or the transport's
//! send-complete interrupt, and `send` hands bytes to a UART driver.  The
//! `host` module (feature `std`) provides the hosted implementation
//! (spinlock critical section, condition-variable drain thread).

#[cfg(any(test, feature = "std"))]
pub mod host;

/// Saved preemption state returned by [`Port::enter_critical_section`] and
/// consumed by [`Port::exit_critical_section`].
///
/// The meaning of the value is private to the port: typically the saved
/// interrupt flag register on bare metal, unused on hosted platforms.
/// Carrying it through the caller lets critical sections nest correctly.
#[derive(Clone, Copy, Debug)]
pub struct RestoreState(pub usize);

/// Platform services required by the logging core.
///
/// All operations are synchronous.  Implementations must be callable from
/// any context the application logs from, including interrupt handlers.
pub trait Port: Sync {
    /// Suspends preemption of the logging core, returning the state
    /// [`Self::exit_critical_section`] needs to undo it.
    ///
    /// The protected windows are short (a few loads and stores); ports
    /// usually disable interrupts outright.  Calls must nest.
    fn enter_critical_section(&self) -> RestoreState;

    /// Restores the preemption state saved by the matching
    /// [`Self::enter_critical_section`].
    fn exit_critical_section(&self, restore: RestoreState);

    /// Requests that the drain run "soon", outside the critical section.
    ///
    /// Idempotent, and invoked with the critical section held; it must not
    /// call back into the logging core synchronously.  Typical
    /// implementations set an event the idle loop or a worker thread
    /// observes.
    fn notify(&self);

    /// Returns `true` when [`Self::send`] will neither block nor overwrite
    /// an in-flight frame.
    fn tx_ready(&self) -> bool;

    /// Hands one encoded frame to the transport.
    ///
    /// The bytes must be fully buffered or transmitted by the time this
    /// returns; the caller reuses the scratch buffer immediately after.
    /// The port re-invokes the drain when transmission completes.
    fn send(&self, frame: &[u8]);
}

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

use picolog_status::{Error, Result};

use crate::packet::Packet;

/// A fixed-capacity packet queue with latched overrun accounting.
///
/// The buffer itself is not synchronized; callers serialize access with the
/// port's critical section.  One slot is permanently sacrificed so that the
/// index pair alone distinguishes empty from full.
///
/// ## Invariants
///
/// For a buffer with `N >= 2`, the following invariants are maintained:
///
/// 1. `0 <= self.head < N` and `0 <= self.tail < N`.
/// 2. The buffer is empty iff `self.head == self.tail`.
/// 3. The buffer is full iff `(self.head + 1) % N == self.tail`; at most
///    `N - 1` packets are queued at any time.
/// 4. The queued packets are stored at indices `self.tail`,
///    `(self.tail + 1) % N`, ..., in enqueue order (FIFO).
/// 5. Once `self.overrun` becomes non-zero it stays non-zero until
///    [`Self::clear_overrun`] is called; while it is non-zero,
///    [`Self::reserve`] never touches the slots or indices.
///
/// Invariant 5 is the overrun latch: a full queue stops accepting packets
/// until the drain has emptied it *and* reported the loss, so producers
/// cannot livelock the drain with continuous re-attempts.
pub struct RingBuffer<const N: usize> {
    slots: [Packet; N],
    head: usize,
    tail: usize,
    // 0 = no overrun; otherwise the number of dropped packets, saturating.
    overrun: u8,
}

impl<const N: usize> RingBuffer<N> {
    /// Creates a new, empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [Packet::EMPTY; N],
            head: 0,
            tail: 0,
            overrun: 0,
        }
    }

    /// Returns `true` if no packets are queued.
    pub const fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Returns the number of queued packets.
    pub const fn len(&self) -> usize {
        (self.head + N - self.tail) % N
    }

    /// Returns the number of packets the buffer can hold.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Reserves the next free slot and advances the head index.
    ///
    /// The returned slot must be filled before the caller leaves its
    /// critical section; dropping the reference commits the packet.  While
    /// the overrun latch is set, or when the queue is full, the drop is
    /// counted and `Error::QueueFull` is returned.
    pub fn reserve(&mut self) -> Result<&mut Packet> {
        if self.overrun != 0 {
            self.overrun = self.overrun.saturating_add(1);
            return Err(Error::QueueFull);
        }

        let next = (self.head + 1) % N;
        if next == self.tail {
            self.overrun = 1;
            return Err(Error::QueueFull);
        }

        let index = self.head;
        self.head = next;
        Ok(&mut self.slots[index])
    }

    /// Removes and returns the oldest packet, if any.
    pub fn dequeue(&mut self) -> Option<Packet> {
        if self.is_empty() {
            return None;
        }
        let packet = self.slots[self.tail];
        self.tail = (self.tail + 1) % N;
        Some(packet)
    }

    /// Number of packets dropped since the latch was set, saturating at 255.
    pub const fn overrun(&self) -> u8 {
        self.overrun
    }

    /// Clears the overrun latch, returning the drop count.
    ///
    /// Called by the drain once the queue has been emptied and the loss is
    /// about to be reported; enqueuing resumes afterwards.
    pub fn clear_overrun(&mut self) -> u8 {
        core::mem::take(&mut self.overrun)
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill<const N: usize>(ring: &mut RingBuffer<N>, count: usize) -> usize {
        let mut accepted = 0;
        for i in 0..count {
            if let Ok(slot) = ring.reserve() {
                slot.set(i as crate::packet::RawId, &[i as u8]);
                accepted += 1;
            }
        }
        accepted
    }

    #[test]
    fn new_buffer_is_empty() {
        let ring = RingBuffer::<8>::new();
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.capacity(), 7);
        assert_eq!(ring.overrun(), 0);
    }

    #[test]
    fn packets_dequeue_in_enqueue_order() {
        let mut ring = RingBuffer::<8>::new();
        assert_eq!(fill(&mut ring, 5), 5);
        for i in 0..5u8 {
            assert_eq!(ring.dequeue().unwrap().payload(), &[i]);
        }
        assert!(ring.dequeue().is_none());
    }

    #[test]
    fn one_slot_is_sacrificed() {
        let mut ring = RingBuffer::<4>::new();
        assert_eq!(fill(&mut ring, 4), 3);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.overrun(), 1);
    }

    #[test]
    fn wrap_around_preserves_order() {
        let mut ring = RingBuffer::<4>::new();
        fill(&mut ring, 2);
        assert_eq!(ring.dequeue().unwrap().payload(), &[0]);
        assert_eq!(ring.dequeue().unwrap().payload(), &[1]);

        // Indices have advanced past the middle of the array; three more
        // packets wrap around the end.
        for i in 10..13u8 {
            ring.reserve().unwrap().set(i as crate::packet::RawId, &[i]);
        }
        assert_eq!(ring.dequeue().unwrap().payload(), &[10]);
        assert_eq!(ring.dequeue().unwrap().payload(), &[11]);
        assert_eq!(ring.dequeue().unwrap().payload(), &[12]);
        assert!(ring.is_empty());
    }

    #[test]
    fn overrun_latch_counts_drops_without_probing() {
        let mut ring = RingBuffer::<4>::new();
        assert_eq!(fill(&mut ring, 10), 3);
        // First failed attempt set the latch to 1; six more incremented it.
        assert_eq!(ring.overrun(), 7);

        // Draining a packet makes room, but the latch still rejects.
        assert!(ring.dequeue().is_some());
        assert!(ring.reserve().is_err());
        assert_eq!(ring.overrun(), 8);

        while ring.dequeue().is_some() {}
        assert_eq!(ring.clear_overrun(), 8);
        assert_eq!(ring.overrun(), 0);
        assert!(ring.reserve().is_ok());
    }

    #[test]
    fn overrun_counter_saturates_at_255() {
        let mut ring = RingBuffer::<2>::new();
        assert_eq!(fill(&mut ring, 300), 1);
        assert_eq!(ring.overrun(), 255);
    }
}

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

//! Hosted port: an atomic spinlock stands in for interrupt masking and a
//! worker thread blocked on a condition variable stands in for the
//! transport's send-complete interrupt.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread;

use crate::logger::{DrainStatus, Logger};
use crate::port::{Port, RestoreState};

#[derive(Default)]
struct Signal {
    pending: bool,
    shutdown: bool,
}

/// [`Port`] implementation for hosted platforms.
///
/// `send` writes frames synchronously to the configured sink, so the
/// transport is always ready.  [`HostPort::spawn_drain`] starts the worker
/// thread that plays the role of the send-complete callback.
pub struct HostPort {
    lock: AtomicBool,
    signal: Mutex<Signal>,
    wakeup: Condvar,
    sink: Mutex<Box<dyn io::Write + Send>>,
}

fn ignore_poison<'a, T>(
    result: Result<MutexGuard<'a, T>, std::sync::PoisonError<MutexGuard<'a, T>>>,
) -> MutexGuard<'a, T> {
    result.unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl HostPort {
    /// Creates a port writing frames to `sink`.
    pub fn new(sink: Box<dyn io::Write + Send>) -> Self {
        Self {
            lock: AtomicBool::new(false),
            signal: Mutex::new(Signal::default()),
            wakeup: Condvar::new(),
            sink: Mutex::new(sink),
        }
    }

    /// Creates a port writing raw frames to standard output.
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Spawns the drain worker: it blocks until [`Port::notify`] fires,
    /// then drains the logger until no more frames move.
    ///
    /// Call [`HostPort::shutdown`] and join the handle to stop it.
    pub fn spawn_drain<const N: usize>(
        &'static self,
        logger: &'static Logger<N>,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || loop {
            let mut signal = ignore_poison(self.signal.lock());
            while !signal.pending && !signal.shutdown {
                signal = ignore_poison(self.wakeup.wait(signal));
            }
            if signal.shutdown {
                return;
            }
            signal.pending = false;
            drop(signal);

            while matches!(logger.drain_once(), DrainStatus::Sent) {}
        })
    }

    /// Asks the drain worker to exit after the current pass.
    pub fn shutdown(&self) {
        let mut signal = ignore_poison(self.signal.lock());
        signal.shutdown = true;
        self.wakeup.notify_one();
    }
}

impl Port for HostPort {
    fn enter_critical_section(&self) -> RestoreState {
        // Hosted stand-in for interrupt masking.  The core never nests its
        // own critical section, so a plain spin is sufficient.
        while self
            .lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
        RestoreState(0)
    }

    fn exit_critical_section(&self, _restore: RestoreState) {
        self.lock.store(false, Ordering::Release);
    }

    fn notify(&self) {
        let mut signal = ignore_poison(self.signal.lock());
        signal.pending = true;
        self.wakeup.notify_one();
    }

    fn tx_ready(&self) -> bool {
        true
    }

    fn send(&self, frame: &[u8]) {
        let mut sink = ignore_poison(self.sink.lock());
        let _ = sink.write_all(frame);
        let _ = sink.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::codec::SENTINEL;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            ignore_poison(self.0.lock()).extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn worker_thread_drains_on_notify() {
        let sink = SharedSink::default();
        let port: &'static HostPort =
            Box::leak(Box::new(HostPort::new(Box::new(sink.clone()))));
        let logger: &'static Logger<8> = Box::leak(Box::new(Logger::new(port)));
        let worker = port.spawn_drain(logger);

        logger.enqueue(1, &[42]);

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let bytes = ignore_poison(sink.0.lock()).clone();
            if bytes.last() == Some(&SENTINEL) {
                break;
            }
            assert!(Instant::now() < deadline, "drain worker never ran");
            thread::sleep(Duration::from_millis(1));
        }

        port.shutdown();
        worker.join().unwrap();
    }
}

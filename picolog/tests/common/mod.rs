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

//! A capture port for the integration suites: frames land in a vector and
//! transport readiness is test controlled.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use picolog::{Port, RestoreState};

pub struct TestPort {
    lock: AtomicBool,
    ready: AtomicBool,
    frames: Mutex<Vec<Vec<u8>>>,
}

impl TestPort {
    pub const fn new() -> Self {
        Self {
            lock: AtomicBool::new(false),
            ready: AtomicBool::new(true),
            frames: Mutex::new(Vec::new()),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Removes and returns the frames captured so far, oldest first.
    pub fn take_frames(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.frames.lock().unwrap())
    }
}

impl Port for TestPort {
    fn enter_critical_section(&self) -> RestoreState {
        while self
            .lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
        RestoreState(0)
    }

    fn exit_critical_section(&self, _restore: RestoreState) {
        self.lock.store(false, Ordering::Release);
    }

    fn notify(&self) {}

    fn tx_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn send(&self, frame: &[u8]) {
        self.frames.lock().unwrap().push(frame.to_vec());
    }
}

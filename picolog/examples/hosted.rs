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

//! Hosted end-to-end demo: log through the macros, let the worker thread
//! drain frames into a capture buffer, then decode the captured stream
//! against the in-process metadata table - the same join a host tool
//! performs against the image.
//!
//! Run with: `cargo run --example hosted --features std`

use std::io;
use std::sync::{Arc, Mutex, OnceLock};

use picolog::port::host::HostPort;
use picolog::Logger;
use picolog_decode::{Detokenizer, Entry, IdWidth};

#[derive(Clone, Default)]
struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

static PORT: OnceLock<HostPort> = OnceLock::new();
static LOGGER: OnceLock<Logger> = OnceLock::new();

fn main() {
    let sink = CaptureSink::default();
    let port = PORT.get_or_init(|| HostPort::new(Box::new(sink.clone())));
    let logger = LOGGER.get_or_init(|| Logger::new(port));
    let worker = port.spawn_drain(logger);

    picolog::install(logger);
    #[cfg(not(feature = "narrow-id"))]
    logger.start();

    picolog::mile!("Boot");
    picolog::info!("Battery: {} mV", 3276u16);
    picolog::info!("Temperature: {}", 36.7 as f32);
    picolog::warn!("Pos: ({},{})", 10u8, 20u8);
    picolog::info!("Operator: {}", "Test1");
    picolog::debug0!("Raw flags:", true, 0x5au8);

    logger.flush();
    port.shutdown();
    worker.join().expect("drain worker panicked");

    let stream = sink.0.lock().unwrap().clone();
    println!("wire stream ({} bytes):", stream.len());
    for frame in stream.split_inclusive(|&b| b == picolog::codec::SENTINEL) {
        let hex: Vec<String> = frame.iter().map(|b| format!("{b:02x}")).collect();
        println!("  {}", hex.join(" "));
    }

    println!("\ndecoded:");
    let detokenizer = Detokenizer::from_image();
    let entries = detokenizer
        .decode_stream(&stream, IdWidth::native())
        .expect("stream decodes");
    for entry in entries {
        match entry {
            Entry::Start => println!("  --- stream start ---"),
            Entry::Overrun(count) => println!("  !!! {count} packet(s) lost"),
            Entry::Log(log) => println!(
                "  [{}] {}:{} {}",
                log.severity.tag(),
                log.file,
                log.line,
                log.message
            ),
        }
    }
}

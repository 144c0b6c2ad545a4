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

//! Macro-to-wire round trips: log invocations go through the installed
//! global logger, the captured stream is decoded against the in-process
//! metadata table, and the reconstruction must match the call bit for bit.

#![cfg(not(feature = "narrow-id"))]

mod common;

use std::sync::{Mutex, MutexGuard, Once};

use common::TestPort;
use picolog::codec::SENTINEL;
use picolog::{Logger, Severity, SiteTable, TypeTag};
use picolog_decode::{parse_stream, Detokenizer, Entry, IdWidth, Value};

static PORT: TestPort = TestPort::new();
static LOGGER: Logger = Logger::new(&PORT);

// The global logger is process-wide state; scenarios run one at a time.
static SCENARIO: Mutex<()> = Mutex::new(());
static INSTALL: Once = Once::new();

fn scenario() -> MutexGuard<'static, ()> {
    let guard = SCENARIO.lock().unwrap_or_else(|e| e.into_inner());
    INSTALL.call_once(|| picolog::install(&LOGGER));
    LOGGER.flush();
    PORT.take_frames();
    guard
}

fn capture_frames() -> Vec<Vec<u8>> {
    LOGGER.flush();
    PORT.take_frames()
}

fn decode(frames: &[Vec<u8>]) -> Vec<Entry> {
    Detokenizer::from_image()
        .decode_stream(&frames.concat(), IdWidth::U16)
        .unwrap()
}

fn single_log(frames: &[Vec<u8>]) -> picolog_decode::DecodedLog {
    let entries = decode(frames);
    assert_eq!(entries.len(), 1, "expected one logical record");
    match entries.into_iter().next().unwrap() {
        Entry::Log(log) => log,
        other => panic!("expected a log entry, got {other:?}"),
    }
}

#[test]
fn no_arg_record_is_one_minimal_frame() {
    let _guard = scenario();

    picolog::info!("Boot");
    let frames = capture_frames();

    // One packet: a single code byte covering the two id bytes, then the
    // sentinel.
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].len(), 4);
    assert_eq!(frames[0][0], 0x03);
    assert_eq!(*frames[0].last().unwrap(), SENTINEL);

    let log = single_log(&frames);
    assert_eq!(log.severity, Severity::Info);
    assert_eq!(log.format, "Boot");
    assert_eq!(log.message, "Boot");
    assert!(log.values.is_empty());
    assert!(log.file.ends_with("end_to_end.rs"));
    assert!(log.line > 0);
}

#[test]
fn every_frame_is_sentinel_terminated_and_sentinel_free_inside() {
    let _guard = scenario();

    picolog::info!("S: {}", 0xa6a6_a6a6u32);
    picolog::info!("T: {}", "\u{a6}\u{a6}" as &str);
    let frames = capture_frames();

    assert!(!frames.is_empty());
    for frame in &frames {
        let (body, terminator) = frame.split_at(frame.len() - 1);
        assert_eq!(terminator, &[SENTINEL]);
        assert!(!body.contains(&SENTINEL));
    }
}

#[test]
fn two_u8_arguments_make_a_two_packet_chain() {
    let _guard = scenario();

    picolog::warn!("Pos: ({},{})", 10u8, 20u8);
    let frames = capture_frames();
    assert_eq!(frames.len(), 2);

    let packets = parse_stream(&frames.concat(), IdWidth::U16).unwrap();
    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].id, packets[1].id);
    assert!(!packets[0].continuation);
    assert!(packets[1].continuation);
    assert_eq!(packets[0].payload, vec![10]);
    assert_eq!(packets[1].payload, vec![20]);

    let log = single_log(&frames);
    assert_eq!(log.severity, Severity::Warn);
    assert_eq!(log.values, vec![Value::U8(10), Value::U8(20)]);
    assert_eq!(log.message, "Pos: (10,20)");
}

#[test]
fn float_payload_is_ieee754_little_endian() {
    let _guard = scenario();

    picolog::info!("Temp: {}", 36.7 as f32);
    let frames = capture_frames();

    let packets = parse_stream(&frames.concat(), IdWidth::U16).unwrap();
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].payload, 36.7f32.to_le_bytes().to_vec());

    let log = single_log(&frames);
    match log.values.as_slice() {
        [Value::F32(decoded)] => assert_eq!(decoded.to_bits(), 36.7f32.to_bits()),
        other => panic!("expected one f32 value, got {other:?}"),
    }
}

#[test]
fn string_argument_chains_to_its_nul() {
    let _guard = scenario();

    picolog::info!("Name: {}", "Test1");
    let frames = capture_frames();

    let packets = parse_stream(&frames.concat(), IdWidth::U16).unwrap();
    assert_eq!(packets.len(), 2);
    assert!(!packets[0].continuation);
    assert!(packets[1].continuation);
    assert_eq!(packets[0].payload, b"Test".to_vec());
    assert_eq!(packets[1].payload, vec![b'1', 0]);

    assert_eq!(single_log(&frames).message, "Name: Test1");
}

#[test]
fn chunk_aligned_string_ends_with_a_lone_nul_packet() {
    let _guard = scenario();

    picolog::info!("Tag: {}", "Four");
    let frames = capture_frames();

    let packets = parse_stream(&frames.concat(), IdWidth::U16).unwrap();
    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].payload, b"Four".to_vec());
    assert_eq!(packets[1].payload, vec![0]);

    assert_eq!(single_log(&frames).message, "Tag: Four");
}

#[test]
fn overlong_string_is_truncated_with_ellipsis() {
    let _guard = scenario();

    picolog::info!("Id: {}", "0123456789abcdefgh");
    let frames = capture_frames();

    let packets = parse_stream(&frames.concat(), IdWidth::U16).unwrap();
    assert_eq!(packets.len(), 5);
    assert_eq!(
        packets.last().unwrap().payload,
        vec![b'.', b'.', b'.', 0]
    );

    assert_eq!(single_log(&frames).message, "Id: 0123456789abcdef...");
}

#[test]
fn all_scalar_types_round_trip_exactly() {
    let _guard = scenario();

    picolog::log!(
        Debug1,
        "{} {} {} {} {} {} {} {}",
        true,
        1u8,
        -2i8,
        3u16,
        -4i16,
        5u32,
        -6i32,
        2.5 as f32,
    );
    let frames = capture_frames();

    // One packet per argument; the first clear, the rest continuations.
    let packets = parse_stream(&frames.concat(), IdWidth::U16).unwrap();
    assert_eq!(packets.len(), 8);
    assert!(!packets[0].continuation);
    assert!(packets[1..].iter().all(|p| p.continuation));
    assert!(packets.iter().all(|p| p.id == packets[0].id));

    let log = single_log(&frames);
    assert_eq!(log.severity, Severity::Debug1);
    assert_eq!(
        log.values,
        vec![
            Value::Bool(true),
            Value::U8(1),
            Value::S8(-2),
            Value::U16(3),
            Value::S16(-4),
            Value::U32(5),
            Value::S32(-6),
            Value::F32(2.5),
        ]
    );

    // The interned type code carries the same sequence of tags.
    let site = SiteTable::get(packets[0].id as picolog::RawId).unwrap();
    let expected = TypeTag::Bool.at(0)
        | TypeTag::U8.at(1)
        | TypeTag::S8.at(2)
        | TypeTag::U16.at(3)
        | TypeTag::S16.at(4)
        | TypeTag::U32.at(5)
        | TypeTag::S32.at(6)
        | TypeTag::F32.at(7);
    assert_eq!(site.typecode(), expected);
}

#[test]
fn labels_with_trailing_values_render_appended() {
    let _guard = scenario();

    picolog::warn!("Pos:", 10u8, 20u8);
    let frames = capture_frames();
    assert_eq!(single_log(&frames).message, "Pos: 10 20");
}

#[test]
fn severity_sugar_maps_to_the_right_levels() {
    let _guard = scenario();

    picolog::error!("e");
    picolog::warn!("w");
    picolog::mile!("m");
    picolog::info!("i");
    picolog::trace!("t");
    picolog::debug0!("d0");
    picolog::debug3!("d3");
    let frames = capture_frames();

    let severities: Vec<Severity> = decode(&frames)
        .into_iter()
        .map(|entry| match entry {
            Entry::Log(log) => log.severity,
            other => panic!("unexpected entry {other:?}"),
        })
        .collect();
    assert_eq!(
        severities,
        vec![
            Severity::Error,
            Severity::Warn,
            Severity::Mile,
            Severity::Info,
            Severity::Trace,
            Severity::Debug0,
            Severity::Debug3,
        ]
    );
}

#[test]
fn records_drain_in_invocation_order() {
    let _guard = scenario();

    picolog::info!("alpha");
    picolog::info!("beta");
    picolog::info!("gamma");
    let frames = capture_frames();

    let messages: Vec<String> = decode(&frames)
        .into_iter()
        .map(|entry| match entry {
            Entry::Log(log) => log.message,
            other => panic!("unexpected entry {other:?}"),
        })
        .collect();
    assert_eq!(messages, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn interned_location_matches_the_invocation() {
    let _guard = scenario();

    let expected_line = line!() + 1;
    picolog::info!("LineProbe");
    let frames = capture_frames();

    let log = single_log(&frames);
    assert_eq!(log.line, expected_line);
    assert!(log.file.ends_with("end_to_end.rs"));
}

#[test]
fn identifiers_are_pairwise_distinct_across_the_image() {
    let _guard = scenario();

    let ids: Vec<_> = SiteTable::iter().map(picolog::site_id).collect();
    // This binary interns plenty of call sites; all must be distinct.
    assert!(ids.len() > 10);
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

//! End-to-end: scripted device through the bridge into a recording sink.

use crate::helpers::*;
use midibridge::prelude::*;

#[test]
fn test_chunks_published_in_order_byte_for_byte() {
    let chunks: Vec<Vec<u8>> = (0..1000).map(midi_chunk).collect();
    let source = ScriptedSource::new(chunks.clone(), SourceEnd::Disconnect);
    let sink = RecordingSink::new();
    let published = sink.handle();

    // Ring larger than the script so nothing can be dropped.
    let config = BridgeConfig::new(TEST_TOPIC).with_capacity(1024);
    let bridge = Bridge::start(config, source, sink).unwrap();

    let err = bridge.wait().unwrap_err();
    assert!(matches!(
        err,
        midibridge::core::Error::Device(DeviceError::Disconnected)
    ));

    let published = published.lock();
    assert_eq!(published.len(), chunks.len());
    for ((topic, bytes), expected) in published.iter().zip(&chunks) {
        assert_eq!(topic, TEST_TOPIC);
        assert_eq!(bytes, expected);
    }
}

#[test]
fn test_stop_reports_counters() {
    let chunks: Vec<Vec<u8>> = (0..50).map(midi_chunk).collect();
    let source = ScriptedSource::new(chunks, SourceEnd::WaitForStop);
    let sink = RecordingSink::new();
    let published = sink.handle();

    let bridge = Bridge::start(BridgeConfig::new(TEST_TOPIC), source, sink).unwrap();
    assert!(wait_until(|| published.lock().len() == 50));

    let report = bridge.stop().unwrap();
    assert_eq!(report.stats.chunks_read, 50);
    assert_eq!(report.stats.enqueued, 50);
    assert_eq!(report.stats.published, 50);
    assert_eq!(report.stats.dropped, 0);
    assert_eq!(report.stats.publish_failures, 0);
    assert_eq!(report.stats.in_flight(), 0);
}

#[test]
fn test_buffers_are_reused() {
    let chunks: Vec<Vec<u8>> = (0..200).map(midi_chunk).collect();
    let source = ScriptedSource::new(chunks, SourceEnd::WaitForStop);
    let sink = RecordingSink::new();
    let published = sink.handle();

    let config = BridgeConfig::new(TEST_TOPIC).with_max_chunk_size(256);
    let bridge = Bridge::start(config, source, sink).unwrap();
    assert!(wait_until(|| published.lock().len() == 200));

    let report = bridge.stop().unwrap();
    // Every chunk needs a buffer; at most one per ring slot plus the two in hand is fresh.
    assert!(report.pool.reused > 0);
    assert!(report.pool.allocated <= 256 + 2);
}

#[test]
fn test_empty_chunks_are_forwarded() {
    let source = ScriptedSource::new(vec![vec![], vec![0xFE], vec![]], SourceEnd::Disconnect);
    let sink = RecordingSink::new();
    let published = sink.handle();

    let bridge = Bridge::start(BridgeConfig::new(TEST_TOPIC), source, sink).unwrap();
    let _ = bridge.wait();

    let bytes: Vec<Vec<u8>> = published.lock().iter().map(|(_, b)| b.clone()).collect();
    assert_eq!(bytes, vec![vec![], vec![0xFE], vec![]]);
}

//! Bridge start/stop/drop and configuration failures.

use crate::helpers::*;
use midibridge::prelude::*;
use midibridge::BridgeStatsSnapshot;
use std::thread;
use std::time::Duration;

/// Emits a clock tick every few milliseconds forever and has no interrupt handle.
struct TickSource;

impl DeviceSource for TickSource {
    fn read_chunk(&mut self, out: &mut [u8]) -> std::result::Result<usize, DeviceError> {
        thread::sleep(Duration::from_millis(2));
        out[0] = 0xF8;
        Ok(1)
    }
}

#[test]
fn test_non_power_of_two_capacity_fails_fast() {
    let source = ScriptedSource::new(Vec::new(), SourceEnd::WaitForStop);
    let config = BridgeConfig::new(TEST_TOPIC).with_capacity(100);
    let err = Bridge::start(config, source, RecordingSink::new()).unwrap_err();
    assert!(matches!(err, midibridge::core::Error::InvalidConfig(_)));
}

#[test]
fn test_power_of_two_capacity_starts() {
    let source = ScriptedSource::new(Vec::new(), SourceEnd::WaitForStop);
    let config = BridgeConfig::new(TEST_TOPIC).with_capacity(128);
    let bridge = Bridge::start(config, source, RecordingSink::new()).unwrap();
    assert!(bridge.is_running());
    assert_eq!(bridge.topic(), TEST_TOPIC);
    bridge.stop().unwrap();
}

#[test]
fn test_stop_idle_bridge() {
    let source = ScriptedSource::new(Vec::new(), SourceEnd::WaitForStop);
    let bridge = Bridge::start(BridgeConfig::new(TEST_TOPIC), source, RecordingSink::new()).unwrap();

    let report = bridge.stop().unwrap();
    assert_eq!(report.stats, BridgeStatsSnapshot::default());
}

#[test]
fn test_stop_without_interrupt_waits_for_next_read() {
    let sink = RecordingSink::new();
    let published = sink.handle();
    let bridge = Bridge::start(BridgeConfig::new(TEST_TOPIC), TickSource, sink).unwrap();

    assert!(wait_until(|| published.lock().len() >= 3));
    let report = bridge.stop().unwrap();
    assert_eq!(report.stats.published, report.stats.enqueued);
    assert_eq!(published.lock().len() as u64, report.stats.published);
}

#[test]
fn test_dropping_bridge_stops_and_drains() {
    let chunks: Vec<Vec<u8>> = (0..64).map(midi_chunk).collect();
    let source = ScriptedSource::new(chunks, SourceEnd::WaitForStop);
    let sink = RecordingSink::new();
    let published = sink.handle();

    {
        let bridge = Bridge::start(BridgeConfig::new(TEST_TOPIC), source, sink).unwrap();
        assert!(wait_until(|| bridge.stats().enqueued == 64));
    }

    // Both threads are joined by drop; everything enqueued went out.
    assert_eq!(published.lock().len(), 64);
}

#[test]
fn test_device_failure_ends_bridge() {
    let source = ScriptedSource::new(vec![vec![0xFA]], SourceEnd::Disconnect);
    let bridge = Bridge::start(BridgeConfig::new(TEST_TOPIC), source, RecordingSink::new()).unwrap();

    assert!(wait_until(|| !bridge.is_running()));
    let err = bridge.wait().unwrap_err();
    assert!(matches!(
        err,
        midibridge::core::Error::Device(DeviceError::Disconnected)
    ));
}

#[test]
fn test_independent_bridges() {
    let sinks: Vec<RecordingSink> = (0..4).map(|_| RecordingSink::new()).collect();
    let handles: Vec<_> = sinks.iter().map(RecordingSink::handle).collect();

    let bridges: Vec<Bridge> = sinks
        .into_iter()
        .enumerate()
        .map(|(i, sink)| {
            let chunks: Vec<Vec<u8>> = (0..=i).map(|n| vec![0xC0, n as u8]).collect();
            let source = ScriptedSource::new(chunks, SourceEnd::WaitForStop);
            Bridge::start(BridgeConfig::new(format!("bridge/{}", i)), source, sink).unwrap()
        })
        .collect();

    for (i, handle) in handles.iter().enumerate() {
        assert!(wait_until(|| handle.lock().len() == i + 1));
    }
    for bridge in bridges {
        bridge.stop().unwrap();
    }

    for (i, handle) in handles.iter().enumerate() {
        let published = handle.lock();
        assert!(published.iter().all(|(topic, _)| topic == &format!("bridge/{}", i)));
    }
}

//! A failed publish is logged and discarded; the pipeline keeps going.

use crate::helpers::*;
use midibridge::prelude::*;

const NOTE_ON: [u8; 3] = [0x90, 60, 100];
const NOTE_OFF: [u8; 3] = [0x80, 60, 0];

#[test]
fn test_next_payload_published_after_failure() {
    let source = ScriptedSource::new(vec![NOTE_ON.to_vec(), NOTE_OFF.to_vec()], SourceEnd::WaitForStop);
    let sink = FailingSink::new(&NOTE_ON);
    let published = sink.handle();

    let bridge = Bridge::start(BridgeConfig::new(TEST_TOPIC), source, sink).unwrap();
    assert!(wait_until(|| bridge.stats().dispatched() == 2));

    let report = bridge.stop().unwrap();
    assert_eq!(report.stats.publish_failures, 1);
    assert_eq!(report.stats.published, 1);
    assert_eq!(
        *published.lock(),
        vec![(TEST_TOPIC.to_string(), NOTE_OFF.to_vec())]
    );
}

#[test]
fn test_failures_never_retried() {
    // Every other payload is rejected.
    let chunks: Vec<Vec<u8>> = (0..100)
        .map(|n| if n % 2 == 0 { NOTE_ON.to_vec() } else { vec![0xB0, 7, n as u8] })
        .collect();
    let source = ScriptedSource::new(chunks, SourceEnd::WaitForStop);
    let sink = FailingSink::new(&NOTE_ON);
    let published = sink.handle();

    let bridge = Bridge::start(BridgeConfig::new(TEST_TOPIC), source, sink).unwrap();
    assert!(wait_until(|| bridge.stats().dispatched() == 100));

    let report = bridge.stop().unwrap();
    assert_eq!(report.stats.publish_failures, 50);
    assert_eq!(report.stats.published, 50);

    let published = published.lock();
    assert_eq!(published.len(), 50);
    for (i, (_, bytes)) in published.iter().enumerate() {
        assert_eq!(bytes, &vec![0xB0, 7, (2 * i + 1) as u8]);
    }
}

#[test]
fn test_publish_failure_is_not_fatal() {
    let source = ScriptedSource::new(vec![NOTE_ON.to_vec()], SourceEnd::WaitForStop);
    let bridge = Bridge::start(BridgeConfig::new(TEST_TOPIC), source, FailingSink::new(&NOTE_ON)).unwrap();

    assert!(wait_until(|| bridge.stats().publish_failures == 1));
    assert!(bridge.is_running());
    assert!(bridge.stop().is_ok());
}

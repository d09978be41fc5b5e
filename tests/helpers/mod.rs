//! Test helpers and fakes for midibridge integration tests
//!
//! - [`ScriptedSource`]: yields a fixed list of chunks, optionally pausing once.
//! - [`RecordingSink`]: keeps every published `(topic, bytes)` pair.
//! - [`FailingSink`]: records, but rejects one specific payload.
//! - [`GatedSink`]: blocks inside `publish` until the test opens the gate.

#![allow(dead_code)]

use crossbeam_channel::{bounded, Receiver, Sender};
use midibridge::prelude::*;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Topic used across the tests.
pub const TEST_TOPIC: &str = "test/midi";

/// Upper bound for any single wait in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What a [`ScriptedSource`] does after its last chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEnd {
    /// Report `DeviceError::Disconnected`.
    Disconnect,
    /// Block until interrupted by `Bridge::stop`.
    WaitForStop,
}

pub struct ScriptedSource {
    chunks: VecDeque<Vec<u8>>,
    end: SourceEnd,
    emitted: usize,
    hold: Option<(usize, Receiver<()>)>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl ScriptedSource {
    pub fn new(chunks: impl IntoIterator<Item = Vec<u8>>, end: SourceEnd) -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            chunks: chunks.into_iter().collect(),
            end,
            emitted: 0,
            hold: None,
            wake_tx,
            wake_rx,
        }
    }

    /// After `count` chunks, block until `resume` receives or disconnects.
    pub fn hold_after(mut self, count: usize, resume: Receiver<()>) -> Self {
        self.hold = Some((count, resume));
        self
    }
}

impl DeviceSource for ScriptedSource {
    fn read_chunk(&mut self, out: &mut [u8]) -> std::result::Result<usize, DeviceError> {
        if let Some((count, _)) = &self.hold {
            if self.emitted == *count {
                if let Some((_, resume)) = self.hold.take() {
                    let _ = resume.recv();
                }
            }
        }

        match self.chunks.pop_front() {
            Some(chunk) => {
                out[..chunk.len()].copy_from_slice(&chunk);
                self.emitted += 1;
                Ok(chunk.len())
            }
            None => match self.end {
                SourceEnd::Disconnect => Err(DeviceError::Disconnected),
                SourceEnd::WaitForStop => {
                    let _ = self.wake_rx.recv();
                    Err(DeviceError::Interrupted)
                }
            },
        }
    }

    fn interrupt_handle(&self) -> Option<InterruptHandle> {
        let wake = self.wake_tx.clone();
        Some(InterruptHandle::new(move || {
            let _ = wake.try_send(());
        }))
    }
}

pub type Published = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

#[derive(Clone, Default)]
pub struct RecordingSink {
    published: Published,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Published {
        Arc::clone(&self.published)
    }
}

impl PublishSink for RecordingSink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> std::result::Result<(), PublishError> {
        self.published
            .lock()
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Rejects payloads equal to `reject`; records the rest.
pub struct FailingSink {
    inner: RecordingSink,
    reject: Vec<u8>,
}

impl FailingSink {
    pub fn new(reject: &[u8]) -> Self {
        Self {
            inner: RecordingSink::new(),
            reject: reject.to_vec(),
        }
    }

    pub fn handle(&self) -> Published {
        self.inner.handle()
    }
}

impl PublishSink for FailingSink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> std::result::Result<(), PublishError> {
        if payload == self.reject.as_slice() {
            return Err(PublishError::Rejected("broker refused payload".to_string()));
        }
        self.inner.publish(topic, payload)
    }
}

/// Signals `entered` on each publish, then blocks until the gate sender is dropped.
pub struct GatedSink {
    inner: RecordingSink,
    entered: Sender<()>,
    gate: Receiver<()>,
}

impl GatedSink {
    /// Returns the sink, the "entered publish" receiver, and the gate (drop it to open).
    pub fn new() -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = bounded(0);
        (
            Self {
                inner: RecordingSink::new(),
                entered: entered_tx,
                gate: gate_rx,
            },
            entered_rx,
            gate_tx,
        )
    }

    pub fn handle(&self) -> Published {
        self.inner.handle()
    }
}

impl PublishSink for GatedSink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> std::result::Result<(), PublishError> {
        let _ = self.entered.send(());
        let _ = self.gate.recv();
        self.inner.publish(topic, payload)
    }
}

/// A note-on message for note `n`, varied in length so chunk sizes differ.
pub fn midi_chunk(n: usize) -> Vec<u8> {
    let note = (n % 128) as u8;
    match n % 3 {
        0 => vec![0x90, note, 100],
        1 => vec![0xF8],
        _ => {
            let mut sysex = vec![0xF0, 0x7D];
            sysex.extend(std::iter::repeat(note).take(n % 32));
            sysex.push(0xF7);
            sysex
        }
    }
}

/// Poll `condition` until it holds or [`TEST_TIMEOUT`] passes.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TEST_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

//! Publish sinks that do not need a broker.

use crossbeam_channel::{bounded, unbounded, Receiver, SendTimeoutError, Sender};
use midibridge_core::{PublishError, PublishSink};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Space-separated uppercase hex, e.g. `90 3C 64`.
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Writes every payload to the log instead of a broker.
#[derive(Debug, Default)]
pub struct LogSink {
    published: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl PublishSink for LogSink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.published += 1;
        info!(topic, len = payload.len(), bytes = %HexBytes(payload), "MIDI");
        Ok(())
    }
}

/// Forwards `(topic, bytes)` pairs to an in-process receiver.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<(String, Vec<u8>)>,
    timeout: Option<Duration>,
}

impl ChannelSink {
    pub fn unbounded() -> (Self, Receiver<(String, Vec<u8>)>) {
        let (tx, rx) = unbounded();
        (Self { tx, timeout: None }, rx)
    }

    /// A bounded channel; a publish that cannot enqueue within `timeout` fails.
    pub fn bounded(capacity: usize, timeout: Duration) -> (Self, Receiver<(String, Vec<u8>)>) {
        let (tx, rx) = bounded(capacity);
        (
            Self {
                tx,
                timeout: Some(timeout),
            },
            rx,
        )
    }
}

impl PublishSink for ChannelSink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let message = (topic.to_string(), payload.to_vec());
        match self.timeout {
            None => self
                .tx
                .send(message)
                .map_err(|_| PublishError::Disconnected),
            Some(timeout) => self.tx.send_timeout(message, timeout).map_err(|e| match e {
                SendTimeoutError::Timeout(_) => PublishError::Timeout(timeout.as_millis() as u64),
                SendTimeoutError::Disconnected(_) => PublishError::Disconnected,
            }),
        }
    }
}

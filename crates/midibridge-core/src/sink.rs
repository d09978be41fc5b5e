//! Broker side of the bridge.

use crate::error::PublishError;

/// Something that delivers payloads to a topic.
///
/// `publish` blocks until the broker acknowledged or refused the payload.
/// A failure is logged by the dispatch loop and the payload is discarded;
/// it is never retried.
pub trait PublishSink: Send + 'static {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

impl<P: PublishSink + ?Sized> PublishSink for Box<P> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        (**self).publish(topic, payload)
    }
}

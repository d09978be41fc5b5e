//! Device -> ring. Runs on its own thread.
//!
//! The device read is the only place this loop blocks. When the ring is full
//! the incoming chunk is dropped rather than stalling the device.

use crate::doorbell::LoopControl;
use crate::error::DeviceError;
use crate::payload::Payload;
use crate::pool::BufferPool;
use crate::ring::RingProducer;
use crate::source::DeviceSource;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

pub(crate) struct AcquisitionLoop<S> {
    source: S,
    producer: RingProducer<Payload>,
    pool: Arc<BufferPool>,
    control: Arc<LoopControl>,
}

impl<S: DeviceSource> AcquisitionLoop<S> {
    pub(crate) fn new(
        source: S,
        producer: RingProducer<Payload>,
        pool: Arc<BufferPool>,
        control: Arc<LoopControl>,
    ) -> Self {
        Self {
            source,
            producer,
            pool,
            control,
        }
    }

    /// Read until the device fails or a stop is requested.
    ///
    /// Consumes the loop so the device source is released when it returns.
    pub(crate) fn run(mut self) -> Result<()> {
        info!(
            capacity = self.producer.capacity(),
            chunk = self.pool.buf_size(),
            "acquisition loop started"
        );
        let outcome = self.read_until_stopped();
        if outcome.is_ok() {
            if self.control.consumer_finished() {
                warn!("dispatch loop exited, acquisition loop stopped");
            } else {
                info!("acquisition loop stopped");
            }
        }
        outcome
    }

    fn read_until_stopped(&mut self) -> Result<()> {
        while !self.control.stop_requested() {
            let mut buffer = self.pool.acquire();
            let len = match self.source.read_chunk(buffer.as_mut_slice()) {
                Ok(len) => len,
                Err(e) => {
                    self.pool.release(buffer);
                    if self.control.stop_requested() {
                        debug!(error = %e, "device read ended during shutdown");
                        return Ok(());
                    }
                    error!(error = %e, "error reading MIDI device");
                    return Err(e.into());
                }
            };

            let payload = match Payload::new(buffer, len) {
                Ok(payload) => payload,
                Err(buffer) => {
                    let capacity = buffer.capacity();
                    self.pool.release(buffer);
                    let e = DeviceError::Overrun {
                        reported: len,
                        capacity,
                    };
                    error!(error = %e, "error reading MIDI device");
                    return Err(e.into());
                }
            };
            self.control.stats.record_read();
            self.enqueue(payload);
        }
        Ok(())
    }

    #[inline]
    fn enqueue(&mut self, payload: Payload) {
        match self.producer.try_push(payload) {
            Ok(()) => {
                self.control.stats.record_enqueued();
                self.control.doorbell.ring();
            }
            Err(rejected) => {
                let dropped = self.control.stats.record_drop();
                warn!(
                    len = rejected.len(),
                    dropped, "ring buffer full, dropping MIDI data"
                );
                self.pool.release(rejected.into_buffer());
            }
        }
        trace!(queued = self.producer.len(), "chunk acquired");
    }
}

//! Ring -> broker. Runs on its own thread.
//!
//! Two states: WAITING (ring empty, parked on the doorbell) and PUBLISHING
//! (one payload handed to the sink). Delivery is at-most-once: a failed
//! publish is logged and the payload discarded.

use crate::doorbell::LoopControl;
use crate::payload::Payload;
use crate::pool::BufferPool;
use crate::ring::RingConsumer;
use crate::sink::PublishSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, trace};

pub(crate) struct DispatchLoop<P> {
    sink: P,
    consumer: RingConsumer<Payload>,
    pool: Arc<BufferPool>,
    control: Arc<LoopControl>,
    topic: String,
    idle_wait: Duration,
}

impl<P: PublishSink> DispatchLoop<P> {
    pub(crate) fn new(
        sink: P,
        consumer: RingConsumer<Payload>,
        pool: Arc<BufferPool>,
        control: Arc<LoopControl>,
        topic: String,
        idle_wait: Duration,
    ) -> Self {
        Self {
            sink,
            consumer,
            pool,
            control,
            topic,
            idle_wait,
        }
    }

    /// Publish until the producer has finished and the ring is drained.
    ///
    /// Consumes the loop so the sink is released when it returns.
    pub(crate) fn run(mut self) {
        info!(topic = %self.topic, "dispatch loop started");
        loop {
            if let Some(payload) = self.consumer.try_pop() {
                self.publish(payload);
                continue;
            }

            if self.control.producer_finished() {
                // Pushes made before the flag was set are visible now.
                match self.consumer.try_pop() {
                    Some(payload) => {
                        self.publish(payload);
                        continue;
                    }
                    None => break,
                }
            }

            let consumer = &self.consumer;
            let control = &self.control;
            control.doorbell.park(
                || !consumer.is_empty() || control.producer_finished(),
                self.idle_wait,
            );
        }
        info!(topic = %self.topic, "dispatch loop stopped");
    }

    fn publish(&mut self, payload: Payload) {
        match self.sink.publish(&self.topic, payload.as_bytes()) {
            Ok(()) => {
                self.control.stats.record_published();
                trace!(topic = %self.topic, len = payload.len(), "payload published");
            }
            Err(e) => {
                let failures = self.control.stats.record_publish_failure();
                error!(
                    topic = %self.topic,
                    len = payload.len(),
                    failures,
                    error = %e,
                    "publish failed, discarding payload"
                );
            }
        }
        self.pool.release(payload.into_buffer());
    }
}

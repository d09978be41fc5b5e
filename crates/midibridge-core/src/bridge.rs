//! Bridge orchestrator: owns the ring and pool, runs both loops.
//!
//! Device -> acquisition thread -> ring -> dispatch thread -> sink.

use crate::acquisition::AcquisitionLoop;
use crate::config::BridgeConfig;
use crate::dispatch::DispatchLoop;
use crate::doorbell::{ConsumerGuard, LoopControl, ProducerGuard};
use crate::pool::{BufferPool, PoolStatsSnapshot};
use crate::ring::RingBuffer;
use crate::sink::PublishSink;
use crate::source::{DeviceSource, InterruptHandle};
use crate::stats::BridgeStatsSnapshot;
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// Final counters, returned when a bridge shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeReport {
    pub stats: BridgeStatsSnapshot,
    pub pool: PoolStatsSnapshot,
}

/// A running device-to-broker pipeline.
///
/// Dropping a running bridge stops it.
pub struct Bridge {
    topic: String,
    control: Arc<LoopControl>,
    pool: Arc<BufferPool>,
    interrupt: Option<InterruptHandle>,
    acquisition: Option<thread::JoinHandle<Result<()>>>,
    dispatch: Option<thread::JoinHandle<()>>,
}

impl Bridge {
    /// Validate `config`, take ownership of `source` and `sink`, and start both loops.
    pub fn start<S, P>(config: BridgeConfig, source: S, sink: P) -> Result<Self>
    where
        S: DeviceSource,
        P: PublishSink,
    {
        config.validate()?;

        let (producer, consumer) = RingBuffer::new(config.capacity)?.split();
        let pool = Arc::new(BufferPool::with_preallocated(
            config.max_chunk_size,
            config.pool_retain(),
            2,
        ));
        let control = Arc::new(LoopControl::new());
        let interrupt = source.interrupt_handle();

        let dispatch = DispatchLoop::new(
            sink,
            consumer,
            Arc::clone(&pool),
            Arc::clone(&control),
            config.topic.clone(),
            config.idle_wait(),
        );
        let dispatch_control = Arc::clone(&control);
        let dispatch_interrupt = interrupt.clone();
        let dispatch = thread::Builder::new()
            .name("midibridge-dispatch".to_string())
            .spawn(move || {
                let _done = ConsumerGuard {
                    control: &dispatch_control,
                    interrupt: dispatch_interrupt,
                };
                dispatch.run()
            })?;

        let acquisition =
            AcquisitionLoop::new(source, producer, Arc::clone(&pool), Arc::clone(&control));
        let acquisition_control = Arc::clone(&control);
        let spawned = thread::Builder::new()
            .name("midibridge-acquire".to_string())
            .spawn(move || {
                let _done = ProducerGuard(&acquisition_control);
                acquisition.run()
            });

        let acquisition = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                control.finish_producer();
                let _ = dispatch.join();
                return Err(e.into());
            }
        };

        info!(
            topic = %config.topic,
            capacity = config.capacity,
            max_chunk_size = config.max_chunk_size,
            "bridge started"
        );

        Ok(Self {
            topic: config.topic,
            control,
            pool,
            interrupt,
            acquisition: Some(acquisition),
            dispatch: Some(dispatch),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// `true` while the acquisition loop is still reading.
    pub fn is_running(&self) -> bool {
        self.acquisition
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stats(&self) -> BridgeStatsSnapshot {
        self.control.stats.snapshot()
    }

    pub fn pool_stats(&self) -> PoolStatsSnapshot {
        self.pool.stats()
    }

    /// Block until the acquisition loop ends on its own, then drain and stop dispatch.
    ///
    /// Returns the device error that ended the loop, if any.
    pub fn wait(mut self) -> Result<BridgeReport> {
        self.join()
    }

    /// Stop both loops and release the device and sink.
    ///
    /// A read that is blocked in the device is woken through the source's
    /// interrupt handle; without one, this waits for the device to return.
    /// Payloads already queued are still published.
    pub fn stop(mut self) -> Result<BridgeReport> {
        self.request_stop();
        self.join()
    }

    fn request_stop(&self) {
        self.control.request_stop();
        match &self.interrupt {
            Some(interrupt) => interrupt.interrupt(),
            None => info!("device source has no interrupt handle, waiting for next read"),
        }
    }

    fn join(&mut self) -> Result<BridgeReport> {
        let acquired = match self.acquisition.take() {
            Some(handle) => handle
                .join()
                .unwrap_or(Err(Error::TaskPanicked("acquisition"))),
            None => Ok(()),
        };

        let dispatched = match self.dispatch.take() {
            Some(handle) => handle.join().map_err(|_| Error::TaskPanicked("dispatch")),
            None => Ok(()),
        };

        let report = BridgeReport {
            stats: self.control.stats.snapshot(),
            pool: self.pool.stats(),
        };
        info!(
            topic = %self.topic,
            published = report.stats.published,
            dropped = report.stats.dropped,
            publish_failures = report.stats.publish_failures,
            "bridge stopped"
        );

        acquired?;
        dispatched?;
        Ok(report)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if self.acquisition.is_none() && self.dispatch.is_none() {
            return;
        }
        self.request_stop();
        if let Err(e) = self.join() {
            warn!(error = %e, "bridge stopped with error");
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("topic", &self.topic)
            .field("running", &self.is_running())
            .finish()
    }
}

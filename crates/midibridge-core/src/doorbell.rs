//! Park/wake signal between the acquisition and dispatch loops.
//!
//! The consumer announces it is about to park, re-checks the ring, then waits
//! on a condition variable. The producer only takes the lock when it sees the
//! announcement, so a push costs one fence and one relaxed load while the
//! consumer is busy.

use crate::source::InterruptHandle;
use crate::stats::BridgeStats;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{fence, AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct Doorbell {
    parked: AtomicBool,
    rung: Mutex<bool>,
    cond: Condvar,
}

impl Doorbell {
    /// Producer side: call after a successful push.
    #[inline]
    pub(crate) fn ring(&self) {
        // Pairs with the fence in `park`: either we see `parked`, or the
        // consumer's readiness check sees our push.
        fence(Ordering::SeqCst);
        if self.parked.load(Ordering::Relaxed) {
            self.wake();
        }
    }

    /// Wake the consumer unconditionally.
    pub(crate) fn wake(&self) {
        let mut rung = self.rung.lock();
        *rung = true;
        self.cond.notify_all();
    }

    /// Consumer side: block until rung, `ready` holds, or `timeout` elapses.
    ///
    /// Returns `true` if woken by a ring or by `ready`, `false` on timeout.
    pub(crate) fn park(&self, ready: impl Fn() -> bool, timeout: Duration) -> bool {
        let mut rung = self.rung.lock();
        self.parked.store(true, Ordering::Relaxed);
        fence(Ordering::SeqCst);

        let woken = if *rung || ready() {
            true
        } else {
            !self.cond.wait_for(&mut rung, timeout).timed_out()
        };

        *rung = false;
        self.parked.store(false, Ordering::Relaxed);
        woken
    }
}

/// Run state shared by the bridge and its two loops.
#[derive(Debug, Default)]
pub(crate) struct LoopControl {
    stop_requested: AtomicBool,
    producer_done: AtomicBool,
    consumer_done: AtomicBool,
    pub(crate) doorbell: Doorbell,
    pub(crate) stats: BridgeStats,
}

impl LoopControl {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.doorbell.wake();
    }

    #[inline]
    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Called once the acquisition loop has made its last push.
    pub(crate) fn finish_producer(&self) {
        self.producer_done.store(true, Ordering::Release);
        self.doorbell.wake();
    }

    /// Once this returns `true`, every push the producer made is visible.
    #[inline]
    pub(crate) fn producer_finished(&self) -> bool {
        self.producer_done.load(Ordering::Acquire)
    }

    /// Called when the dispatch loop exits. Nothing drains the ring after
    /// this, so the producer is told to stop too.
    pub(crate) fn finish_consumer(&self) {
        self.consumer_done.store(true, Ordering::Release);
        self.request_stop();
    }

    pub(crate) fn consumer_finished(&self) -> bool {
        self.consumer_done.load(Ordering::Acquire)
    }
}

/// Marks the producer finished when dropped, including on unwind.
pub(crate) struct ProducerGuard<'a>(pub(crate) &'a LoopControl);

impl Drop for ProducerGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_producer();
    }
}

/// Marks the consumer finished when dropped and wakes a blocked device read.
pub(crate) struct ConsumerGuard<'a> {
    pub(crate) control: &'a LoopControl,
    pub(crate) interrupt: Option<InterruptHandle>,
}

impl Drop for ConsumerGuard<'_> {
    fn drop(&mut self) {
        self.control.finish_consumer();
        if let Some(interrupt) = &self.interrupt {
            interrupt.interrupt();
        }
    }
}

//! Pipeline counters shared by both loops.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters. Relaxed atomics; they are for observation, not synchronization.
#[derive(Debug, Default)]
pub struct BridgeStats {
    chunks_read: AtomicU64,
    enqueued: AtomicU64,
    dropped: AtomicU64,
    published: AtomicU64,
    publish_failures: AtomicU64,
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_read(&self) {
        self.chunks_read.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the running drop count including this one.
    #[inline]
    pub(crate) fn record_drop(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the running failure count including this one.
    #[inline]
    pub(crate) fn record_publish_failure(&self) -> u64 {
        self.publish_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> BridgeStatsSnapshot {
        BridgeStatsSnapshot {
            chunks_read: self.chunks_read.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStatsSnapshot {
    pub chunks_read: u64,
    pub enqueued: u64,
    pub dropped: u64,
    pub published: u64,
    pub publish_failures: u64,
}

impl BridgeStatsSnapshot {
    /// Payloads that left the ring, whatever the publish outcome.
    pub fn dispatched(&self) -> u64 {
        self.published + self.publish_failures
    }

    /// Enqueued but not yet dispatched.
    pub fn in_flight(&self) -> u64 {
        self.enqueued.saturating_sub(self.dispatched())
    }

    /// Fraction of reads dropped under backpressure (0.0 to 1.0).
    pub fn drop_rate(&self) -> f64 {
        if self.chunks_read == 0 {
            return 0.0;
        }
        self.dropped as f64 / self.chunks_read as f64
    }
}

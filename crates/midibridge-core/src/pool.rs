//! Reuse pool for fixed-size byte buffers.
//!
//! Buffers are owned values: whoever holds a [`PooledBuffer`] is its only
//! user, and handing it back to the pool moves it. A buffer can therefore never
//! be refilled while a payload built from it is still queued.

use crossbeam::queue::ArrayQueue;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A byte buffer of at least `buf_size` bytes, checked out of a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer {
    data: Vec<u8>,
}

impl PooledBuffer {
    fn with_size(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// Usable length. Always the full allocation; payload length is tracked separately.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Lock-free buffer pool, safe to share between the two loops.
#[derive(Debug)]
pub struct BufferPool {
    buf_size: usize,
    free: ArrayQueue<Vec<u8>>,
    stats: PoolStats,
}

impl BufferPool {
    /// `retain` bounds how many idle buffers are kept; releases beyond that are freed.
    pub fn new(buf_size: usize, retain: usize) -> Self {
        Self {
            buf_size,
            free: ArrayQueue::new(retain.max(1)),
            stats: PoolStats::default(),
        }
    }

    /// Fill the pool up front so steady state never allocates.
    pub fn with_preallocated(buf_size: usize, retain: usize, count: usize) -> Self {
        let pool = Self::new(buf_size, retain);
        for _ in 0..count.min(pool.free.capacity()) {
            let _ = pool.free.push(vec![0; buf_size]);
            pool.stats.allocated.fetch_add(1, Ordering::Relaxed);
        }
        pool
    }

    pub fn buf_size(&self) -> usize {
        self.buf_size
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.free.len()
    }

    /// Take a recycled buffer, or allocate one if the pool is empty.
    pub fn acquire(&self) -> PooledBuffer {
        while let Some(data) = self.free.pop() {
            if data.len() >= self.buf_size {
                self.stats.reused.fetch_add(1, Ordering::Relaxed);
                return PooledBuffer { data };
            }
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.allocated.fetch_add(1, Ordering::Relaxed);
        PooledBuffer::with_size(self.buf_size)
    }

    /// Return a buffer for reuse. Undersized buffers and surplus beyond the
    /// retention bound are freed instead.
    pub fn release(&self, buffer: PooledBuffer) {
        if buffer.data.len() < self.buf_size || self.free.push(buffer.data).is_err() {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }
}

#[derive(Debug, Default)]
struct PoolStats {
    allocated: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
}

impl PoolStats {
    fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatsSnapshot {
    /// Fresh allocations.
    pub allocated: u64,
    /// Acquisitions served from the pool.
    pub reused: u64,
    /// Buffers freed instead of retained.
    pub discarded: u64,
}

impl PoolStatsSnapshot {
    /// Fraction of acquisitions served without allocating (0.0 to 1.0).
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.allocated + self.reused;
        if total == 0 {
            return 0.0;
        }
        self.reused as f64 / total as f64
    }
}

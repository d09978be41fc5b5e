//! Bounded SPSC ring buffer.
//!
//! `head` and `tail` are free-running counters; a slot index is
//! `counter & mask`. `head - tail` (wrapping) stays within `[0, capacity]`.
//!
//! - Producer: writes the slot, then publishes it with a release store of `head`.
//! - Consumer: takes the slot, then frees it with a release store of `tail`.
//!
//! Each side acquires the other side's counter before touching a slot, so a
//! consumer never observes a half-written slot and a producer never overwrites
//! one that is still being read.

use crate::config::validate_capacity;
use crate::Result;
use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared<T> {
    slots: Box<[UnsafeCell<Option<T>>]>,
    mask: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

// SAFETY: A slot is only touched by the producer while it is outside
// [tail, head) and only by the consumer while it is inside; the cursor
// acquire/release pairs hand each slot over between the two.
unsafe impl<T: Send> Send for Shared<T> {}
// SAFETY: See above. Exactly one producer and one consumer exist because
// `RingBuffer::split` consumes the ring and the halves are not `Clone`.
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Shared<T> {
    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }
}

/// Fixed-capacity ring. Split it to use it.
pub struct RingBuffer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> RingBuffer<T> {
    /// Fails with [`Error::InvalidConfig`](crate::Error::InvalidConfig) unless
    /// `capacity` is a nonzero power of two.
    pub fn new(capacity: usize) -> Result<Self> {
        validate_capacity(capacity)?;
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(None))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Ok(Self {
            shared: Arc::new(Shared {
                slots,
                mask: capacity - 1,
                head: CachePadded::new(AtomicUsize::new(0)),
                tail: CachePadded::new(AtomicUsize::new(0)),
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn split(self) -> (RingProducer<T>, RingConsumer<T>) {
        (
            RingProducer {
                shared: Arc::clone(&self.shared),
            },
            RingConsumer {
                shared: self.shared,
            },
        )
    }
}

impl<T> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.shared.capacity())
            .field("len", &self.shared.len())
            .finish()
    }
}

/// Write half. Only one exists per ring.
pub struct RingProducer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> RingProducer<T> {
    /// Enqueue `value` unless the ring is full, in which case it is handed back
    /// untouched. Never blocks.
    #[inline]
    pub fn try_push(&mut self, value: T) -> std::result::Result<(), T> {
        let shared = &*self.shared;
        let head = shared.head.load(Ordering::Relaxed);
        let tail = shared.tail.load(Ordering::Acquire);
        if head.wrapping_sub(tail) >= shared.capacity() {
            return Err(value);
        }

        // SAFETY: `head` is outside [tail, head), so the consumer will not read
        // this slot until the release store below publishes it.
        unsafe {
            *shared.slots[head & shared.mask].get() = Some(value);
        }
        shared.head.store(head.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}

/// Read half. Only one exists per ring.
pub struct RingConsumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> RingConsumer<T> {
    /// Dequeue the oldest value, or `None` if the ring is empty. Never blocks.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        let shared = &*self.shared;
        let tail = shared.tail.load(Ordering::Relaxed);
        let head = shared.head.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        // SAFETY: `tail` is inside [tail, head) and the acquire load of `head`
        // makes the producer's write visible. The producer will not reuse the
        // slot until the release store below.
        let value = unsafe { (*shared.slots[tail & shared.mask].get()).take() };
        shared.tail.store(tail.wrapping_add(1), Ordering::Release);
        value
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        self.shared.head.load(Ordering::Acquire) == tail
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}

impl<T> std::fmt::Debug for RingProducer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingProducer")
            .field("capacity", &self.shared.capacity())
            .field("len", &self.shared.len())
            .finish()
    }
}

impl<T> std::fmt::Debug for RingConsumer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingConsumer")
            .field("capacity", &self.shared.capacity())
            .field("len", &self.shared.len())
            .finish()
    }
}

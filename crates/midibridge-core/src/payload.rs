//! One chunk of device data in flight.

use crate::pool::PooledBuffer;

/// Opaque device bytes backed by a pooled buffer.
///
/// Immutable once built; the buffer goes back to the pool via
/// [`Payload::into_buffer`] after publishing.
#[derive(Debug)]
pub struct Payload {
    buffer: PooledBuffer,
    len: usize,
}

impl Payload {
    /// Wrap the first `len` bytes of `buffer`. Returns the buffer back if
    /// `len` exceeds its capacity.
    pub fn new(buffer: PooledBuffer, len: usize) -> Result<Self, PooledBuffer> {
        if len > buffer.capacity() {
            return Err(buffer);
        }
        Ok(Self { buffer, len })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer.as_slice()[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn into_buffer(self) -> PooledBuffer {
        self.buffer
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

//! Device side of the bridge.

use crate::error::DeviceError;
use std::sync::Arc;

/// Something that produces raw device bytes, one chunk per call.
///
/// Implementations own the device handle; the bridge moves the source onto
/// the acquisition thread and drops it there when the loop ends.
pub trait DeviceSource: Send + 'static {
    /// Fill `out` with the next chunk and return how many bytes were written.
    ///
    /// May block until data arrives. An error is fatal to the acquisition loop.
    fn read_chunk(&mut self, out: &mut [u8]) -> Result<usize, DeviceError>;

    /// A way to wake a blocked [`read_chunk`](Self::read_chunk) from another
    /// thread, making it return [`DeviceError::Interrupted`].
    ///
    /// Sources without one can only be stopped by the device itself.
    fn interrupt_handle(&self) -> Option<InterruptHandle> {
        None
    }
}

impl<S: DeviceSource + ?Sized> DeviceSource for Box<S> {
    fn read_chunk(&mut self, out: &mut [u8]) -> Result<usize, DeviceError> {
        (**self).read_chunk(out)
    }

    fn interrupt_handle(&self) -> Option<InterruptHandle> {
        (**self).interrupt_handle()
    }
}

/// Cross-thread trigger that unblocks a pending device read.
#[derive(Clone)]
pub struct InterruptHandle {
    trigger: Arc<dyn Fn() + Send + Sync>,
}

impl InterruptHandle {
    pub fn new(trigger: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            trigger: Arc::new(trigger),
        }
    }

    pub fn interrupt(&self) {
        (self.trigger)();
    }
}

impl std::fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptHandle").finish_non_exhaustive()
    }
}

//! Core pipeline for midibridge.
//!
//! Moves opaque MIDI byte chunks from a device to a broker topic through a
//! bounded lock-free hand-off:
//!
//! ```text
//! DeviceSource -> AcquisitionLoop -> RingBuffer -> DispatchLoop -> PublishSink
//!                        \______ BufferPool ______/
//! ```
//!
//! - **Bounded**: the ring has a fixed power-of-two capacity; when it is full the
//!   newest chunk is dropped and logged, the device read is never stalled.
//! - **Ordered**: one producer, one consumer, FIFO end to end.
//! - **Allocation-free steady state**: buffers cycle through a pool.
//! - **No busy-wait**: an idle dispatch loop parks until the producer rings.
//!
//! # Example
//!
//! ```ignore
//! use midibridge_core::{Bridge, BridgeConfig};
//!
//! let bridge = Bridge::start(BridgeConfig::new("midi/in"), device, sink)?;
//! let report = bridge.wait()?; // returns when the device fails
//! ```

pub mod error;
pub use error::{DeviceError, Error, PublishError, Result};

pub mod config;
pub use config::BridgeConfig;

pub mod ring;
pub use ring::{RingBuffer, RingConsumer, RingProducer};

pub mod pool;
pub use pool::{BufferPool, PoolStatsSnapshot, PooledBuffer};

mod payload;
pub use payload::Payload;

mod source;
pub use source::{DeviceSource, InterruptHandle};

mod sink;
pub use sink::PublishSink;

pub mod stats;
pub use stats::{BridgeStats, BridgeStatsSnapshot};

mod doorbell;

mod acquisition;
mod bridge;
mod dispatch;
pub use bridge::{Bridge, BridgeReport};

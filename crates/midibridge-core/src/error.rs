//! Error types for midibridge-core.

use thiserror::Error;

/// Error type for bridge construction and lifecycle.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Device read failed: {0}")]
    Device(#[from] DeviceError),

    #[error("{0} task panicked")]
    TaskPanicked(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a [`DeviceSource`](crate::DeviceSource).
///
/// Any of these ends the acquisition loop; the bridge never reconnects.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device disconnected")]
    Disconnected,

    #[error("device read interrupted")]
    Interrupted,

    #[error("device reported {reported} bytes for a {capacity} byte buffer")]
    Overrun { reported: usize, capacity: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure reported by a [`PublishSink`](crate::PublishSink).
///
/// Never fatal: the dispatch loop logs it and moves on to the next payload.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("publish rejected: {0}")]
    Rejected(String),

    #[error("publish timed out after {0}ms")]
    Timeout(u64),

    #[error("broker disconnected")]
    Disconnected,

    #[error("{0}")]
    Other(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

//! Bridge configuration.
//!
//! Values only; loading them from disk is the caller's business.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default ring capacity (slots).
pub const DEFAULT_CAPACITY: usize = 256;

/// Default maximum chunk size, the largest SysEx message a virtual port accepts.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 65535;

pub const DEFAULT_TOPIC: &str = "midi";

pub const DEFAULT_IDLE_WAIT_MS: u64 = 50;

/// Configuration for a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Ring buffer slots. Must be a power of two.
    pub capacity: usize,
    /// Size of every pooled buffer, i.e. the largest chunk one device read can deliver.
    pub max_chunk_size: usize,
    /// Topic every payload is published to.
    pub topic: String,
    /// Buffers the pool keeps for reuse. `None` means `capacity + 2`.
    pub pool_retain: Option<usize>,
    /// Upper bound on one dispatch park while the ring is empty.
    pub idle_wait_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            topic: DEFAULT_TOPIC.to_string(),
            pool_retain: None,
            idle_wait_ms: DEFAULT_IDLE_WAIT_MS,
        }
    }
}

impl BridgeConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    pub fn with_pool_retain(mut self, retain: usize) -> Self {
        self.pool_retain = Some(retain);
        self
    }

    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait_ms = idle_wait.as_millis().max(1) as u64;
        self
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    pub fn pool_retain(&self) -> usize {
        self.pool_retain.unwrap_or(self.capacity + 2)
    }

    pub fn validate(&self) -> Result<()> {
        validate_capacity(self.capacity)?;
        if self.max_chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "max_chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.topic.trim().is_empty() {
            return Err(Error::InvalidConfig("topic must not be empty".to_string()));
        }
        if self.pool_retain == Some(0) {
            return Err(Error::InvalidConfig(
                "pool_retain must be greater than 0".to_string(),
            ));
        }
        if self.idle_wait_ms == 0 {
            return Err(Error::InvalidConfig(
                "idle_wait_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 || !capacity.is_power_of_two() {
        return Err(Error::InvalidConfig(format!(
            "ring capacity {} is not a power of two",
            capacity
        )));
    }
    Ok(())
}

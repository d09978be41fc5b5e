//! # midibridge
//!
//! Forwards raw MIDI bytes from a device to a publish/subscribe topic.
//!
//! ## Architecture
//!
//! midibridge is an umbrella crate over:
//! - **midibridge-core** - Ring buffer, buffer pool, acquisition and dispatch loops, `Bridge`
//! - **midibridge-io** - Config file, logging, sinks (log, channel, MQTT), virtual MIDI input port
//!
//! Reading and publishing run on separate threads joined by a bounded SPSC
//! ring. A slow broker never stalls the device: when the ring is full the
//! newest chunk is dropped and logged.
//!
//! ## Quick Start
//!
//! ```ignore
//! use midibridge::prelude::*;
//!
//! let config = AppConfig::load("config.toml")?;
//! let source = MidiPortSource::open(&config.midi)?;
//! let bridge = Bridge::start(config.bridge_config(), source, LogSink::new())?;
//! let report = bridge.wait()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - `midi-io`, `mqtt`
//! - `midi-io` - Virtual MIDI input port via midir
//! - `mqtt` - MQTT broker sink via rumqttc

/// Re-export of midibridge-core for direct access
pub use midibridge_core as core;

/// Re-export of midibridge-io for direct access
pub use midibridge_io as io;

pub use midibridge_core::{
    // Pipeline
    Bridge,
    BridgeConfig,
    BridgeReport,
    // Stats
    BridgeStats,
    BridgeStatsSnapshot,
    PoolStatsSnapshot,
    // Seams
    DeviceSource,
    InterruptHandle,
    PublishSink,
    // Errors
    DeviceError,
    PublishError,
};

pub use midibridge_io::{AppConfig, ChannelSink, LogSink, LoggerConfig, MidiConfig, MqttConfig};

#[cfg(feature = "mqtt")]
pub use midibridge_io::MqttSink;

#[cfg(feature = "midi-io")]
pub use midibridge_io::{list_input_ports, MidiInputPortInfo, MidiPortSource};

pub mod error;
pub use error::{Error, Result};

pub mod prelude {
    // Pipeline
    pub use crate::{Bridge, BridgeConfig, BridgeReport};

    // Seams
    pub use crate::{DeviceError, DeviceSource, InterruptHandle, PublishError, PublishSink};

    // Config and sinks
    pub use crate::{AppConfig, ChannelSink, LogSink};

    #[cfg(feature = "midi-io")]
    pub use crate::MidiPortSource;

    #[cfg(feature = "mqtt")]
    pub use crate::MqttSink;

    pub use crate::{Error, Result};
}

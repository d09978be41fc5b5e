//! I/O adapters for midibridge.
//!
//! Provides the TOML config loader, log setup, publish sinks and the
//! virtual MIDI input port.
//!
//! Feature gates: `midi-io` (virtual port via midir, and the `midibridge` binary),
//! `mqtt` (broker sink via rumqttc).

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{AppConfig, LoggerConfig, MidiConfig, MqttConfig, DEFAULT_CONFIG_PATH};

pub mod logging;

mod sinks;
pub use sinks::{ChannelSink, HexBytes, LogSink};

#[cfg(feature = "midi-io")]
mod midi;

#[cfg(feature = "midi-io")]
pub use midi::{list_input_ports, MidiInputPortInfo, MidiPortSource};

#[cfg(feature = "mqtt")]
mod mqtt;

#[cfg(feature = "mqtt")]
pub use mqtt::MqttSink;

//! Application configuration, loaded from a TOML file.
//!
//! ```toml
//! [bridge]
//! capacity = 256
//! topic = "studio/midi"
//!
//! [midi]
//! port_name = "midibridge"
//! max_sysex_length = 65535
//!
//! [mqtt]
//! broker = "localhost"
//! port = 1883
//!
//! [logger]
//! filename = "logs/midibridge.log"
//! level = "info"
//! ```
//!
//! Every key is optional. Without an `[mqtt]` section payloads go to the log.

use crate::{Error, Result};
use midibridge_core::BridgeConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bridge: BridgeConfig,
    pub midi: MidiConfig,
    pub mqtt: Option<MqttConfig>,
    pub logger: LoggerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Name of the virtual input port to create.
    pub port_name: String,
    /// Largest message the port forwards; longer SysEx is discarded.
    pub max_sysex_length: usize,
    /// Messages held between the port callback and the acquisition loop.
    pub queue_capacity: usize,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            port_name: "midibridge".to_string(),
            max_sysex_length: 65535,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker host name or address.
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    /// Overrides `bridge.topic` when set.
    pub topic: Option<String>,
    pub keep_alive_secs: u64,
    /// How long to wait for the broker's CONNACK at startup.
    pub connect_timeout_ms: u64,
    /// Publish requests buffered ahead of the network.
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: "localhost".to_string(),
            port: 1883,
            client_id: "midibridge".to_string(),
            topic: None,
            keep_alive_secs: 30,
            connect_timeout_ms: 5000,
            request_capacity: 64,
        }
    }
}

impl MqttConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.broker.trim().is_empty() {
            return Err(invalid("mqtt.broker must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("mqtt.port must be greater than 0"));
        }
        if self.client_id.is_empty() {
            return Err(invalid("mqtt.client_id must not be empty"));
        }
        if self.keep_alive_secs < 5 {
            return Err(invalid("mqtt.keep_alive_secs must be at least 5"));
        }
        if self.connect_timeout_ms == 0 || self.request_capacity == 0 {
            return Err(invalid(
                "mqtt.connect_timeout_ms and mqtt.request_capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub filename: PathBuf,
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Also log to stderr.
    pub console: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            filename: PathBuf::from("logs/midibridge.log"),
            level: "info".to_string(),
            console: true,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.bridge_config().validate()?;
        if self.midi.port_name.trim().is_empty() {
            return Err(invalid("midi.port_name must not be empty"));
        }
        if self.midi.max_sysex_length == 0 {
            return Err(invalid("midi.max_sysex_length must be greater than 0"));
        }
        if self.midi.queue_capacity == 0 {
            return Err(invalid("midi.queue_capacity must be greater than 0"));
        }
        if let Some(mqtt) = &self.mqtt {
            mqtt.validate()?;
        }
        if self.logger.filename.as_os_str().is_empty() {
            return Err(invalid("logger.filename must not be empty"));
        }
        Ok(())
    }

    /// Core config with chunk buffers large enough for any message the port
    /// forwards, and the MQTT topic if one is set.
    pub fn bridge_config(&self) -> BridgeConfig {
        let mut bridge = self.bridge.clone();
        bridge.max_chunk_size = bridge.max_chunk_size.max(self.midi.max_sysex_length);
        if let Some(topic) = self.mqtt.as_ref().and_then(|mqtt| mqtt.topic.clone()) {
            bridge.topic = topic;
        }
        bridge
    }
}

fn invalid(msg: &str) -> Error {
    midibridge_core::Error::InvalidConfig(msg.to_string()).into()
}

//! `midibridge [CONFIG]`: forward a virtual MIDI input port to an MQTT broker,
//! or to the log when no `[mqtt]` section is configured.

use midibridge_core::{Bridge, PublishSink};
use midibridge_io::{logging, AppConfig, LogSink, MidiPortSource, Result, DEFAULT_CONFIG_PATH};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("midibridge: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(&path)?;
    logging::init(&config.logger)?;

    let bridge_config = config.bridge_config();
    tracing::info!(config = %path, topic = %bridge_config.topic, "starting midibridge");

    let sink = open_sink(&config)?;
    let source = MidiPortSource::open(&config.midi)?;
    let bridge = Bridge::start(bridge_config, source, sink)?;

    // Runs until the port goes away or a read fails.
    let report = bridge.wait()?;
    tracing::info!(
        chunks_read = report.stats.chunks_read,
        published = report.stats.published,
        dropped = report.stats.dropped,
        publish_failures = report.stats.publish_failures,
        pool_reuse = report.pool.reuse_ratio(),
        "midibridge stopped"
    );
    Ok(())
}

fn open_sink(config: &AppConfig) -> Result<Box<dyn PublishSink>> {
    match &config.mqtt {
        #[cfg(feature = "mqtt")]
        Some(mqtt) => Ok(Box::new(midibridge_io::MqttSink::connect(mqtt)?)),
        #[cfg(not(feature = "mqtt"))]
        Some(_) => {
            tracing::warn!("built without the `mqtt` feature, logging payloads instead");
            Ok(Box::new(LogSink::new()))
        }
        None => {
            tracing::info!("no [mqtt] section, logging payloads instead");
            Ok(Box::new(LogSink::new()))
        }
    }
}

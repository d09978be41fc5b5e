//! MQTT broker as a [`PublishSink`].
//!
//! Publishes with QoS 0 and no retain flag. The rumqttc event loop is driven
//! on a dedicated thread; reconnecting after a lost connection is left to it.

use crate::config::MqttConfig;
use crate::{Error, Result};
use crossbeam_channel::{bounded, Sender};
use midibridge_core::{PublishError, PublishSink};
use rumqttc::{
    Client, ClientError, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet, QoS,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Publishes payloads to an MQTT broker.
///
/// Sends a DISCONNECT and stops the event loop thread when dropped.
pub struct MqttSink {
    client: Client,
    broker: String,
    connected: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    event_thread: Option<thread::JoinHandle<()>>,
}

impl MqttSink {
    /// Connect and wait for the broker to accept the session.
    pub fn connect(config: &MqttConfig) -> Result<Self> {
        config.validate()?;

        let broker = format!("{}:{}", config.broker, config.port);
        let mut options = MqttOptions::new(config.client_id.as_str(), config.broker.as_str(), config.port);
        options.set_keep_alive(config.keep_alive());
        options.set_clean_session(true);

        let (client, connection) = Client::new(options, config.request_capacity);
        let connected = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = bounded(1);

        let event_thread = {
            let broker = broker.clone();
            let connected = Arc::clone(&connected);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("midibridge-mqtt".to_string())
                .spawn(move || drive(connection, &broker, &connected, &shutdown, ready_tx))?
        };

        match ready_rx.recv_timeout(config.connect_timeout()) {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => {
                let _ = event_thread.join();
                return Err(Error::Mqtt(format!("connect to {} failed: {}", broker, reason)));
            }
            Err(_) => {
                // The event loop may still be inside a TCP connect; let it finish on its own.
                shutdown.store(true, Ordering::Release);
                let _ = client.disconnect();
                return Err(Error::Mqtt(format!(
                    "no CONNACK from {} within {}ms",
                    broker, config.connect_timeout_ms
                )));
            }
        }

        info!(broker = %broker, client_id = %config.client_id, "connected to MQTT broker");
        Ok(Self {
            client,
            broker,
            connected,
            shutdown,
            event_thread: Some(event_thread),
        })
    }

    pub fn broker(&self) -> &str {
        &self.broker
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Poll the event loop until disconnected or shut down.
fn drive(
    mut connection: Connection,
    broker: &str,
    connected: &AtomicBool,
    shutdown: &AtomicBool,
    ready: Sender<std::result::Result<(), String>>,
) {
    let mut ready = Some(ready);
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    connected.store(true, Ordering::Release);
                    match ready.take() {
                        Some(ready) => {
                            let _ = ready.send(Ok(()));
                        }
                        None => info!(broker, "reconnected to MQTT broker"),
                    }
                } else if let Some(ready) = ready.take() {
                    let _ = ready.send(Err(format!("broker refused session: {:?}", ack.code)));
                    break;
                } else {
                    warn!(broker, code = ?ack.code, "broker refused session");
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                connected.store(false, Ordering::Release);
                if let Some(ready) = ready.take() {
                    let _ = ready.send(Err(e.to_string()));
                    break;
                }
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                warn!(broker, error = %e, "MQTT connection lost, retrying");
                thread::sleep(RECONNECT_DELAY);
            }
        }
    }
    debug!(broker, "MQTT event loop stopped");
}

fn publish_error(e: ClientError) -> PublishError {
    match e {
        ClientError::Request(_) => PublishError::Disconnected,
        ClientError::TryRequest(_) => PublishError::Rejected("request queue full".to_string()),
    }
}

impl PublishSink for MqttSink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> std::result::Result<(), PublishError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(PublishError::Disconnected);
        }
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(publish_error)
    }
}

impl Drop for MqttSink {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        let _ = self.client.disconnect();
        if let Some(handle) = self.event_thread.take() {
            let _ = handle.join();
        }
        info!(broker = %self.broker, "disconnected from MQTT broker");
    }
}

impl std::fmt::Debug for MqttSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttSink")
            .field("broker", &self.broker)
            .field("connected", &self.is_connected())
            .finish()
    }
}

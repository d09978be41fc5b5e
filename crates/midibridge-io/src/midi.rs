//! Virtual MIDI input port as a [`DeviceSource`].
//!
//! The midir connection lives on a dedicated thread for platform
//! thread-safety. Its callback forwards each message through a bounded
//! channel; `read_chunk` blocks on that channel.

use crate::config::MidiConfig;
use crate::{Error, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use midibridge_core::{DeviceError, DeviceSource, InterruptHandle};
use midir::{Ignore, MidiInput, MidiInputConnection};
use smallvec::SmallVec;
use std::thread;
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "midibridge";

/// One raw MIDI message. Short messages stay inline.
type MidiMessage = SmallVec<[u8; 8]>;

/// Information about an available MIDI input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiInputPortInfo {
    pub index: usize,
    pub name: String,
}

/// List the input ports currently visible to this process.
pub fn list_input_ports() -> Vec<MidiInputPortInfo> {
    let mut ports = Vec::new();
    if let Ok(midi_input) = MidiInput::new("midibridge-port-list") {
        for (index, port) in midi_input.ports().iter().enumerate() {
            let name = midi_input
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown Port {}", index));
            ports.push(MidiInputPortInfo { index, name });
        }
    }
    ports
}

/// Reads messages from a virtual MIDI input port.
///
/// The port is closed when the source is dropped.
pub struct MidiPortSource {
    port_name: String,
    messages: Receiver<MidiMessage>,
    wake_rx: Receiver<()>,
    wake_tx: Sender<()>,
    shutdown: Option<Sender<()>>,
    port_thread: Option<thread::JoinHandle<()>>,
}

impl MidiPortSource {
    /// Create the port and wait until it is live.
    pub fn open(config: &MidiConfig) -> Result<Self> {
        let (message_tx, messages) = bounded(config.queue_capacity.max(1));
        let (ready_tx, ready_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let (wake_tx, wake_rx) = bounded(1);

        let requested = config.port_name.clone();
        let max_len = config.max_sysex_length;
        let port_thread = thread::Builder::new()
            .name("midibridge-midi-port".to_string())
            .spawn(move || {
                Self::port_thread(requested, max_len, message_tx, ready_tx, shutdown_rx)
            })?;

        let port_name = match ready_rx.recv() {
            Ok(Ok(name)) => name,
            Ok(Err(e)) => {
                let _ = port_thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = port_thread.join();
                return Err(Error::MidiPort("MIDI port thread exited".to_string()));
            }
        };

        info!(port = %port_name, "virtual MIDI port created");
        Ok(Self {
            port_name,
            messages,
            wake_rx,
            wake_tx,
            shutdown: Some(shutdown_tx),
            port_thread: Some(port_thread),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn port_thread(
        requested: String,
        max_len: usize,
        message_tx: Sender<MidiMessage>,
        ready_tx: Sender<Result<String>>,
        shutdown_rx: Receiver<()>,
    ) {
        let connection = match Self::connect(&requested, max_len, message_tx) {
            Ok((connection, name)) => {
                let _ = ready_tx.send(Ok(name));
                connection
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        // Shutdown message or the source being dropped.
        let _ = shutdown_rx.recv();
        drop(connection);
        info!(port = %requested, "virtual MIDI port closed");
    }

    #[cfg(unix)]
    fn connect(
        requested: &str,
        max_len: usize,
        message_tx: Sender<MidiMessage>,
    ) -> Result<(MidiInputConnection<()>, String)> {
        use midir::os::unix::VirtualInput;

        let mut midi_input = MidiInput::new(CLIENT_NAME)?;
        midi_input.ignore(Ignore::None);
        let connection =
            midi_input.create_virtual(requested, Self::forward(max_len, message_tx), ())?;
        Ok((connection, requested.to_string()))
    }

    /// No virtual ports here: attach to an existing port whose name contains `requested`.
    #[cfg(not(unix))]
    fn connect(
        requested: &str,
        max_len: usize,
        message_tx: Sender<MidiMessage>,
    ) -> Result<(MidiInputConnection<()>, String)> {
        let mut midi_input = MidiInput::new(CLIENT_NAME)?;
        midi_input.ignore(Ignore::None);

        let needle = requested.to_lowercase();
        let port = midi_input
            .ports()
            .into_iter()
            .find(|port| {
                midi_input
                    .port_name(port)
                    .is_ok_and(|name| name.to_lowercase().contains(&needle))
            })
            .ok_or_else(|| Error::MidiPort(format!("No MIDI port matching '{}' found", requested)))?;
        let name = midi_input
            .port_name(&port)
            .unwrap_or_else(|_| requested.to_string());

        let connection = midi_input.connect(
            &port,
            "midibridge-input",
            Self::forward(max_len, message_tx),
            (),
        )?;
        Ok((connection, name))
    }

    fn forward(
        max_len: usize,
        message_tx: Sender<MidiMessage>,
    ) -> impl FnMut(u64, &[u8], &mut ()) + Send + 'static {
        move |_timestamp, message, _| {
            if message.len() > max_len {
                warn!(
                    len = message.len(),
                    max_len, "MIDI message exceeds max_sysex_length, discarding"
                );
                return;
            }
            match message_tx.try_send(SmallVec::from_slice(message)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("MIDI input queue full, dropping message");
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!("MIDI input queue closed");
                }
            }
        }
    }
}

impl DeviceSource for MidiPortSource {
    fn read_chunk(&mut self, out: &mut [u8]) -> std::result::Result<usize, DeviceError> {
        loop {
            select! {
                recv(self.messages) -> message => {
                    let message = message.map_err(|_| DeviceError::Disconnected)?;
                    if message.len() > out.len() {
                        warn!(
                            len = message.len(),
                            capacity = out.len(),
                            "MIDI message larger than chunk buffer, discarding"
                        );
                        continue;
                    }
                    out[..message.len()].copy_from_slice(&message);
                    return Ok(message.len());
                }
                recv(self.wake_rx) -> _ => return Err(DeviceError::Interrupted),
            }
        }
    }

    fn interrupt_handle(&self) -> Option<InterruptHandle> {
        let wake = self.wake_tx.clone();
        Some(InterruptHandle::new(move || {
            let _ = wake.try_send(());
        }))
    }
}

impl Drop for MidiPortSource {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.try_send(());
        }
        if let Some(handle) = self.port_thread.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for MidiPortSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiPortSource")
            .field("port_name", &self.port_name)
            .field("queued", &self.messages.len())
            .finish()
    }
}

//! MIDI controller input for the dual-sphere looper
//!
//! Connects to a MIDI port with midir, maps incoming notes and CCs to
//! looper controls, and hands [`ControlMessage`]s to the control thread,
//! which converts them into engine commands.
//!
//! # Architecture
//!
//! ```text
//! MIDI driver thread        control thread              audio thread
//! ┌────────────────┐  flume  ┌──────────────────┐  rtrb  ┌──────────────┐
//! │ parse + map    │ ──────▶ │ MidiController   │ ─────▶ │ LooperEngine │
//! └────────────────┘         │ .drain()         │        └──────────────┘
//!                            └──────────────────┘
//! ```

mod config;
mod connection;
mod input;
mod mapping;
mod messages;
mod normalize;

pub use config::{
    default_midi_config_path, load_midi_config, save_midi_config, ButtonBehavior, ControlMapping,
    DeviceProfile, EncoderMode, LooperAction, MidiConfig, MidiControlConfig,
};
pub use connection::{list_input_ports, port_matches, MidiConnectionError};
pub use input::{MidiInputEvent, MidiInputHandler};
pub use mapping::MappingEngine;
pub use messages::ControlMessage;
pub use normalize::{cc_to_unit, encoder_to_delta};

use flume::{Receiver, Sender};
use std::path::Path;

/// Capacity of the callback → control thread channel
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Connected MIDI controller
pub struct MidiController {
    input_handler: MidiInputHandler,
    message_rx: Receiver<ControlMessage>,
    profile_name: String,
}

impl MidiController {
    /// Load the mapping file and connect to a port
    ///
    /// `port_override` is a port-name substring. Without it, the first
    /// device profile whose `port_match` names an available port is used.
    pub fn new(config_path: &Path, port_override: Option<&str>) -> Result<Self, MidiError> {
        let config = load_midi_config(config_path);
        Self::with_config(&config, port_override)
    }

    pub fn with_config(config: &MidiConfig, port_override: Option<&str>) -> Result<Self, MidiError> {
        let ports = list_input_ports()?;
        log::info!("MIDI: {} input port(s) available", ports.len());
        for port in &ports {
            log::debug!("  - {}", port);
        }

        let port_match = match port_override {
            Some(pattern) => pattern.to_string(),
            None => config
                .devices
                .iter()
                .find(|d| ports.iter().any(|p| port_matches(p, &d.port_match)))
                .map(|d| d.port_match.clone())
                .ok_or(MidiError::NoDeviceFound)?,
        };

        let port_name = ports
            .iter()
            .find(|p| port_matches(p, &port_match))
            .ok_or_else(|| MidiConnectionError::PortNotFound(port_match.clone()))?;
        let profile = config
            .profile_for_port(port_name)
            .ok_or(MidiError::NoDeviceFound)?;

        let (message_tx, message_rx): (Sender<ControlMessage>, _) =
            flume::bounded(MESSAGE_CHANNEL_CAPACITY);
        let input_handler = MidiInputHandler::connect(&port_match, profile, message_tx)?;

        Ok(Self {
            input_handler,
            message_rx,
            profile_name: profile.name.clone(),
        })
    }

    pub fn port_name(&self) -> &str {
        self.input_handler.port_name()
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    /// Next pending message, if any (non-blocking)
    pub fn try_recv(&self) -> Option<ControlMessage> {
        self.message_rx.try_recv().ok()
    }

    /// All pending messages (non-blocking)
    pub fn drain(&self) -> Vec<ControlMessage> {
        self.message_rx.try_iter().collect()
    }
}

/// MIDI controller errors
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("Connection error: {0}")]
    ConnectionError(#[from] MidiConnectionError),

    #[error("No configured MIDI device found")]
    NoDeviceFound,
}

//! MIDI port discovery
//!
//! Uses midir for cross-platform MIDI input (ALSA on Linux, CoreMIDI on macOS, WinMM on Windows).

use midir::{MidiInput, MidiInputPort};

/// Error type for MIDI connection operations
#[derive(Debug, thiserror::Error)]
pub enum MidiConnectionError {
    #[error("Failed to initialize MIDI input: {0}")]
    InputInitError(String),

    #[error("No MIDI input ports available")]
    NoInputPorts,

    #[error("No MIDI port found matching pattern: {0}")]
    PortNotFound(String),

    #[error("Failed to connect to MIDI port: {0}")]
    ConnectionError(String),

    #[error("Failed to get port info: {0}")]
    PortInfoError(String),
}

/// Case-insensitive substring match used for every port lookup
pub fn port_matches(port_name: &str, pattern: &str) -> bool {
    port_name.to_lowercase().contains(&pattern.to_lowercase())
}

fn new_input() -> Result<MidiInput, MidiConnectionError> {
    MidiInput::new("sphere-looper-in").map_err(|e| MidiConnectionError::InputInitError(e.to_string()))
}

/// Names of every MIDI input port currently visible
pub fn list_input_ports() -> Result<Vec<String>, MidiConnectionError> {
    let midi_in = new_input()?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}

/// Find the first input port whose name contains `port_match`
///
/// Returns the `MidiInput` too so the caller can connect with its own callback.
pub fn find_input_port(port_match: &str) -> Result<(MidiInput, MidiInputPort, String), MidiConnectionError> {
    let midi_in = new_input()?;

    let in_ports = midi_in.ports();
    if in_ports.is_empty() {
        return Err(MidiConnectionError::NoInputPorts);
    }

    let input_port = in_ports
        .into_iter()
        .find(|port| {
            midi_in
                .port_name(port)
                .map(|name| port_matches(&name, port_match))
                .unwrap_or(false)
        })
        .ok_or_else(|| MidiConnectionError::PortNotFound(port_match.to_string()))?;

    let port_name = midi_in
        .port_name(&input_port)
        .map_err(|e| MidiConnectionError::PortInfoError(e.to_string()))?;

    log::info!("MIDI: Found input port: {}", port_name);

    Ok((midi_in, input_port, port_name))
}

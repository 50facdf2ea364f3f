//! MIDI input handling
//!
//! Receives raw MIDI bytes from the midir callback, maps them to looper
//! controls and forwards the result to the control thread over a flume channel.

use crate::config::{DeviceProfile, MidiControlConfig};
use crate::mapping::MappingEngine;
use crate::messages::ControlMessage;
use crate::MidiConnectionError;
use flume::Sender;
use midir::MidiInputConnection;

/// Raw MIDI input event (before action mapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiInputEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl MidiInputEvent {
    /// Parse raw MIDI bytes into an event
    ///
    /// MIDI message format:
    /// - Note Off: 0x8n nn vv (n=channel, nn=note, vv=velocity)
    /// - Note On: 0x9n nn vv
    /// - Control Change: 0xBn cc vv (cc=controller, vv=value)
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;
        if rest.len() < 2 {
            return None;
        }
        let channel = status & 0x0F;
        let (d1, d2) = (rest[0], rest[1]);

        match status & 0xF0 {
            0x80 => Some(Self::NoteOff {
                channel,
                note: d1,
                velocity: d2,
            }),
            // Note On with velocity 0 is a Note Off
            0x90 if d2 == 0 => Some(Self::NoteOff {
                channel,
                note: d1,
                velocity: 0,
            }),
            0x90 => Some(Self::NoteOn {
                channel,
                note: d1,
                velocity: d2,
            }),
            0xB0 => Some(Self::ControlChange {
                channel,
                cc: d1,
                value: d2,
            }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. } => *channel,
        }
    }

    /// Check if this event matches a control config
    pub fn matches(&self, control: &MidiControlConfig) -> bool {
        match (self, control) {
            (
                Self::NoteOn { channel, note, .. } | Self::NoteOff { channel, note, .. },
                MidiControlConfig::Note {
                    channel: ctrl_ch,
                    note: ctrl_note,
                },
            ) => channel == ctrl_ch && note == ctrl_note,
            (
                Self::ControlChange { channel, cc, .. },
                MidiControlConfig::ControlChange {
                    channel: ctrl_ch,
                    cc: ctrl_cc,
                },
            ) => channel == ctrl_ch && cc == ctrl_cc,
            _ => false,
        }
    }

    /// Note On, or CC above the midpoint
    pub fn is_press(&self) -> bool {
        match self {
            Self::NoteOn { velocity, .. } => *velocity > 0,
            Self::ControlChange { value, .. } => *value > 63,
            Self::NoteOff { .. } => false,
        }
    }

    pub fn is_release(&self) -> bool {
        !self.is_press()
    }

    /// Velocity for notes, value for CC
    pub fn value(&self) -> u8 {
        match self {
            Self::NoteOn { velocity, .. } | Self::NoteOff { velocity, .. } => *velocity,
            Self::ControlChange { value, .. } => *value,
        }
    }
}

/// Callback data passed to midir
struct CallbackData {
    message_tx: Sender<ControlMessage>,
    mapping_engine: MappingEngine,
}

/// MIDI input handler
///
/// Owns the midir connection; dropping it disconnects.
pub struct MidiInputHandler {
    _connection: MidiInputConnection<CallbackData>,
    port_name: String,
}

impl MidiInputHandler {
    /// Connect to the first port matching `port_match`
    pub fn connect(
        port_match: &str,
        profile: &DeviceProfile,
        message_tx: Sender<ControlMessage>,
    ) -> Result<Self, MidiConnectionError> {
        let (midi_in, port, port_name) = crate::connection::find_input_port(port_match)?;

        let callback_data = CallbackData {
            message_tx,
            mapping_engine: MappingEngine::new(profile),
        };

        let connection = midi_in
            .connect(&port, "sphere-looper-input", Self::midi_callback, callback_data)
            .map_err(|e| MidiConnectionError::ConnectionError(e.to_string()))?;

        log::info!(
            "MIDI: Input handler connected to '{}' using profile '{}'",
            port_name,
            profile.name
        );

        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Called from the MIDI driver thread; must not block
    fn midi_callback(_timestamp: u64, data: &[u8], callback_data: &mut CallbackData) {
        let Some(event) = MidiInputEvent::parse(data) else {
            return;
        };

        if let Some(message) = callback_data.mapping_engine.map_event(&event) {
            if callback_data.message_tx.try_send(message).is_err() {
                log::warn!("MIDI: Message channel full, dropping message");
            }
        }
    }
}

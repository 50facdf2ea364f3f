//! MIDI event → looper control mapping
//!
//! Built from a [`DeviceProfile`]. Lives inside the midir callback, so
//! toggle state is plain data owned by the engine.

use crate::config::{ButtonBehavior, ControlMapping, DeviceProfile, LooperAction};
use crate::input::MidiInputEvent;
use crate::messages::ControlMessage;
use crate::normalize::{cc_to_unit, encoder_to_delta};

pub struct MappingEngine {
    mappings: Vec<ControlMapping>,
    /// Current level of each toggle mapping (indexed like `mappings`)
    toggled: Vec<bool>,
}

impl MappingEngine {
    pub fn new(profile: &DeviceProfile) -> Self {
        Self {
            mappings: profile.mappings.clone(),
            toggled: vec![false; profile.mappings.len()],
        }
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }

    /// Map a raw event to a control message
    ///
    /// The first matching mapping wins. Returns `None` for unmapped events
    /// and for events that carry no change (zero encoder delta, toggle release).
    pub fn map_event(&mut self, event: &MidiInputEvent) -> Option<ControlMessage> {
        let idx = self.mappings.iter().position(|m| event.matches(&m.control))?;
        let ControlMapping {
            action,
            encoder_mode,
            scale,
            ..
        } = self.mappings[idx];

        match action {
            LooperAction::Rotate { channel, axis } => {
                let MidiInputEvent::ControlChange { value, .. } = *event else {
                    return None;
                };
                let delta = encoder_to_delta(value, encoder_mode).saturating_mul(scale);
                (delta != 0).then_some(ControlMessage::Rotate {
                    channel,
                    axis,
                    delta,
                })
            }
            LooperAction::Mix => match *event {
                MidiInputEvent::ControlChange { value, .. } => {
                    Some(ControlMessage::Mix(cc_to_unit(value)))
                }
                _ => None,
            },
            LooperAction::Record => {
                self.button_level(idx, event).map(ControlMessage::Record)
            }
            LooperAction::TrackSwitch => {
                self.button_level(idx, event).map(ControlMessage::TrackSwitch)
            }
        }
    }

    fn button_level(&mut self, idx: usize, event: &MidiInputEvent) -> Option<bool> {
        match self.mappings[idx].behavior {
            ButtonBehavior::Momentary => Some(event.is_press()),
            ButtonBehavior::Toggle => {
                if !event.is_press() {
                    return None;
                }
                self.toggled[idx] = !self.toggled[idx];
                Some(self.toggled[idx])
            }
        }
    }
}

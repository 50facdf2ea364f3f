//! MIDI mapping schema and loader
//!
//! Mappings are stored as YAML next to the looper config.
//! Default location: ~/Music/sphere-looper/midi.yaml

use serde::{Deserialize, Serialize};
use sphere_core::config::{default_config_path, load_config, save_config};
use sphere_core::{Axis, ChannelId};
use std::path::{Path, PathBuf};

use crate::connection::port_matches;

/// Root MIDI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Device profiles (matched by port name)
    pub devices: Vec<DeviceProfile>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            devices: vec![DeviceProfile::generic()],
        }
    }
}

impl MidiConfig {
    /// Profile for a connected port
    ///
    /// Picks the first profile whose `port_match` is contained in the port
    /// name, falling back to the first profile.
    pub fn profile_for_port(&self, port_name: &str) -> Option<&DeviceProfile> {
        self.devices
            .iter()
            .find(|d| port_matches(port_name, &d.port_match))
            .or_else(|| self.devices.first())
    }
}

/// Mappings for one controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Human-readable device name
    pub name: String,

    /// Port name substring to match (case-insensitive)
    pub port_match: String,

    /// Control-to-action mappings
    #[serde(default)]
    pub mappings: Vec<ControlMapping>,
}

impl DeviceProfile {
    /// Built-in layout for a two-sphere controller
    ///
    /// CC 16-19 on channel 1 are the four encoders (A X, A Y, B X, B Y),
    /// notes 36/37 are record and track switch, CC 7 is the mix knob.
    pub fn generic() -> Self {
        let rotate = |cc, channel, axis| ControlMapping {
            control: MidiControlConfig::cc(0, cc),
            action: LooperAction::Rotate { channel, axis },
            encoder_mode: EncoderMode::Relative,
            scale: 1,
            behavior: ButtonBehavior::Momentary,
        };
        let button = |note, action| ControlMapping {
            control: MidiControlConfig::note(0, note),
            action,
            encoder_mode: EncoderMode::default(),
            scale: 1,
            behavior: ButtonBehavior::Momentary,
        };

        Self {
            name: "Generic Sphere Controller".to_string(),
            port_match: "sphere".to_string(),
            mappings: vec![
                rotate(16, ChannelId::A, Axis::X),
                rotate(17, ChannelId::A, Axis::Y),
                rotate(18, ChannelId::B, Axis::X),
                rotate(19, ChannelId::B, Axis::Y),
                button(36, LooperAction::Record),
                button(37, LooperAction::TrackSwitch),
                ControlMapping {
                    control: MidiControlConfig::cc(0, 7),
                    action: LooperAction::Mix,
                    encoder_mode: EncoderMode::Absolute,
                    scale: 1,
                    behavior: ButtonBehavior::Momentary,
                },
            ],
        }
    }
}

/// One MIDI control bound to one looper action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMapping {
    /// MIDI control that triggers this mapping
    pub control: MidiControlConfig,

    pub action: LooperAction,

    /// Value format for encoder (rotate) mappings
    #[serde(default)]
    pub encoder_mode: EncoderMode,

    /// Ticks per encoder step; negative values invert direction
    #[serde(default = "default_scale")]
    pub scale: i64,

    /// Press handling for record/track-switch mappings
    #[serde(default)]
    pub behavior: ButtonBehavior,
}

fn default_scale() -> i64 {
    1
}

/// MIDI control identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MidiControlConfig {
    Note { channel: u8, note: u8 },
    ControlChange { channel: u8, cc: u8 },
}

impl MidiControlConfig {
    pub fn note(channel: u8, note: u8) -> Self {
        Self::Note { channel, note }
    }

    pub fn cc(channel: u8, cc: u8) -> Self {
        Self::ControlChange { channel, cc }
    }
}

/// Looper control driven by a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LooperAction {
    /// Encoder motion on one sphere axis
    Rotate { channel: ChannelId, axis: Axis },
    /// Record-enable level
    Record,
    /// Track-switch level
    TrackSwitch,
    /// Dry ratio from an absolute knob or fader
    Mix,
}

/// Encoder value format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderMode {
    /// Offset from center (64)
    Absolute,
    /// 1-63 clockwise, 65-127 counter-clockwise
    #[default]
    Relative,
    /// 64 = no change, above/below = direction
    RelativeSigned,
}

/// How a button press maps to a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonBehavior {
    /// Level follows the button (high while held)
    #[default]
    Momentary,
    /// Each press flips the level
    Toggle,
}

/// Default MIDI config path
///
/// Returns: `~/Music/sphere-looper/midi.yaml`
pub fn default_midi_config_path() -> PathBuf {
    default_config_path("midi.yaml")
}

/// Load MIDI configuration, falling back to the built-in profile
pub fn load_midi_config(path: &Path) -> MidiConfig {
    let config: MidiConfig = load_config(path);
    log::info!("load_midi_config: {} device profile(s)", config.devices.len());
    for device in &config.devices {
        log::info!(
            "  - {} (port_match: '{}', {} mappings)",
            device.name,
            device.port_match,
            device.mappings.len()
        );
    }
    config
}

/// Save MIDI configuration to a YAML file
pub fn save_midi_config(config: &MidiConfig, path: &Path) -> anyhow::Result<()> {
    save_config(config, path)
}

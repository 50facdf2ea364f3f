//! Messages sent from the MIDI callback to the control thread

use sphere_core::engine::EngineCommand;
use sphere_core::{Axis, ChannelId};

/// A looper control change decoded from MIDI
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMessage {
    /// Encoder motion in ticks
    Rotate {
        channel: ChannelId,
        axis: Axis,
        delta: i64,
    },
    /// Record-enable level
    Record(bool),
    /// Track-switch level
    TrackSwitch(bool),
    /// Dry ratio in [0, 1]
    Mix(f32),
}

impl From<ControlMessage> for EngineCommand {
    fn from(message: ControlMessage) -> Self {
        match message {
            ControlMessage::Rotate {
                channel,
                axis,
                delta,
            } => EngineCommand::Rotate {
                channel,
                axis,
                delta,
            },
            ControlMessage::Record(on) => EngineCommand::SetRecord(on),
            ControlMessage::TrackSwitch(on) => EngineCommand::SetTrackSwitch(on),
            ControlMessage::Mix(mix) => EngineCommand::SetMix(mix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_engine_command() {
        let cmd: EngineCommand = ControlMessage::Rotate {
            channel: ChannelId::B,
            axis: Axis::X,
            delta: -3,
        }
        .into();
        assert_eq!(
            cmd,
            EngineCommand::Rotate {
                channel: ChannelId::B,
                axis: Axis::X,
                delta: -3
            }
        );
        assert_eq!(
            EngineCommand::from(ControlMessage::TrackSwitch(true)),
            EngineCommand::SetTrackSwitch(true)
        );
        assert_eq!(
            EngineCommand::from(ControlMessage::Mix(0.25)),
            EngineCommand::SetMix(0.25)
        );
    }
}

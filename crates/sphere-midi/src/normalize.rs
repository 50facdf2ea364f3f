//! Value conversion for MIDI controls
//!
//! Encoders report motion in one of several relative formats; faders and
//! knobs report absolute 0-127 values that map onto the unit range.

use crate::config::EncoderMode;

/// Normalize a MIDI CC value (0-127) to `[0, 1]`
pub fn cc_to_unit(midi_value: u8) -> f32 {
    (midi_value.min(127) as f32) / 127.0
}

/// Convert an encoder value to a signed tick delta
///
/// Different encoders send different relative value formats:
/// - Relative: 1-63 = CW amount, 65-127 = CCW amount (64 is unused)
/// - RelativeSigned: <64 = CCW, >64 = CW, 64 = no change
/// - Absolute: offset from the center value
pub fn encoder_to_delta(midi_value: u8, mode: EncoderMode) -> i64 {
    let value = midi_value as i64;
    match mode {
        EncoderMode::Absolute => value - 64,
        EncoderMode::Relative => match midi_value {
            1..=63 => value,
            65..=u8::MAX => -(value - 64),
            _ => 0,
        },
        EncoderMode::RelativeSigned => value - 64,
    }
}

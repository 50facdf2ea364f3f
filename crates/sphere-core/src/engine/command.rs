//! Lock-free command queue for looper control
//!
//! The control thread (MIDI forwarding, the binary's main loop) pushes
//! commands into an `rtrb` ring; the audio thread drains it at the start
//! of every block. Control levels set here are held for every frame of
//! that block.
//!
//! # Usage
//!
//! ```ignore
//! let (mut tx, mut rx) = command_channel();
//!
//! // Control thread (never blocks)
//! tx.push(EngineCommand::Rotate { channel: ChannelId::A, axis: Axis::X, delta: 3 })?;
//!
//! // Audio thread
//! engine.process_commands(&mut rx);
//! ```

use crate::types::{Axis, ChannelId};

/// Commands sent from the control thread to the audio thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    /// Relative encoder motion
    Rotate {
        channel: ChannelId,
        axis: Axis,
        delta: i64,
    },
    /// Absolute tick count (decoders that report position)
    SetPosition {
        channel: ChannelId,
        axis: Axis,
        ticks: i64,
    },
    /// Record-enable level
    SetRecord(bool),
    /// Track-switch level; the engine detects the rising edge
    SetTrackSwitch(bool),
    /// Dry ratio, clamped to [0, 1] by the engine
    SetMix(f32),
    /// Jump a channel straight to a slot (wrapped modulo the slot count)
    SelectSlot { channel: ChannelId, slot: usize },
}

/// Capacity of the command queue
///
/// A fast spin on both spheres produces a few hundred encoder messages per
/// second; 1024 covers several audio blocks of backlog.
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Create a new command channel (producer/consumer pair)
///
/// Returns `(Producer, Consumer)` where the producer is owned by the control
/// thread and the consumer by the audio thread.
pub fn command_channel() -> (rtrb::Producer<EngineCommand>, rtrb::Consumer<EngineCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

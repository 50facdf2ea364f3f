//! Audio system handles shared with the control thread

use std::sync::Arc;

use crate::engine::{ChannelAtomics, EngineCommand, EngineStats};
use crate::types::NUM_CHANNELS;

use super::cpal_backend::AudioHandle;

/// Result of starting the audio system
///
/// Contains everything the control thread needs while audio runs.
pub struct AudioSystemResult {
    /// Handle to keep audio alive (drop to stop)
    pub handle: AudioHandle,
    /// Command sender for the control thread (lock-free)
    pub command_sender: CommandSender,
    /// Per-channel state for lock-free reads
    pub channel_atomics: [Arc<ChannelAtomics>; NUM_CHANNELS],
    /// Engine counters
    pub stats: Arc<EngineStats>,
    /// Sample rate of the audio system
    pub sample_rate: u32,
    /// Buffer size in frames
    pub buffer_size: u32,
    /// Output latency in milliseconds
    pub latency_ms: f32,
}

/// Command sender for the control thread
///
/// Wraps the lock-free producer for sending [`EngineCommand`] to the audio thread.
pub struct CommandSender {
    pub(crate) producer: rtrb::Producer<EngineCommand>,
}

impl CommandSender {
    pub fn new(producer: rtrb::Producer<EngineCommand>) -> Self {
        Self { producer }
    }

    /// Send a command to the engine (non-blocking)
    ///
    /// Returns `Err(cmd)` if the queue is full.
    pub fn send(&mut self, cmd: EngineCommand) -> Result<(), EngineCommand> {
        self.producer.push(cmd).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }

    /// Check if the queue has space for more commands
    pub fn has_space(&self) -> bool {
        self.producer.slots() > 0
    }
}

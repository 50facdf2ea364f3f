//! Looper engine: two channel engines over one shared bank

use std::sync::Arc;

use super::address::AddressMapper;
use super::atomics::{ChannelAtomics, EngineStats};
use super::bank::{BankError, BufferBank};
use super::channel::{ChannelState, FrameContext};
use super::command::EngineCommand;
use super::switcher::TrackSwitcher;
use crate::config::LooperConfig;
use crate::types::{ChannelId, ControlFrame, Sample, StereoSample, NUM_CHANNELS};

/// The complete real-time looper
///
/// Owns the bank and both channel states. Everything here runs on the audio
/// thread: commands are drained at block start, then each frame runs the
/// switcher, both channels, and writes one stereo frame (A left, B right).
///
/// Both channels read and write the same bank. When they target the same
/// slot a read may observe a write from the other channel made earlier in
/// the same frame; either value is acceptable.
pub struct LooperEngine {
    mapper: AddressMapper,
    bank: BufferBank,
    channels: [ChannelState; NUM_CHANNELS],
    switcher: TrackSwitcher,
    controls: ControlFrame,
    record_channels: [bool; NUM_CHANNELS],
    slot_count: usize,
    stats: Arc<EngineStats>,
}

impl LooperEngine {
    /// Build an engine over a fully populated bank
    ///
    /// `config` must already be validated; the bank must match its shape.
    pub fn new(config: &LooperConfig, bank: BufferBank) -> Result<Self, BankError> {
        let expected = config.bank_shape();
        if bank.shape() != expected {
            return Err(BankError::ShapeMismatch {
                expected,
                actual: bank.shape(),
            });
        }

        Ok(Self {
            mapper: AddressMapper::new(config),
            bank,
            channels: ChannelId::ALL.map(|id| ChannelState::new(id, config.poll_frames)),
            switcher: TrackSwitcher::new(),
            controls: ControlFrame {
                mix: config.default_mix,
                ..Default::default()
            },
            record_channels: config.record_channels,
            slot_count: config.slot_count,
            stats: Arc::new(EngineStats::new()),
        })
    }

    pub fn bank(&self) -> &BufferBank {
        &self.bank
    }

    pub fn channel(&self, id: ChannelId) -> &ChannelState {
        &self.channels[id.index()]
    }

    pub fn controls(&self) -> ControlFrame {
        self.controls
    }

    pub fn mapper(&self) -> &AddressMapper {
        &self.mapper
    }

    /// Lock-free per-channel state, for the control thread
    pub fn channel_atomics(&self) -> [Arc<ChannelAtomics>; NUM_CHANNELS] {
        [self.channels[0].atomics(), self.channels[1].atomics()]
    }

    pub fn stats(&self) -> Arc<EngineStats> {
        Arc::clone(&self.stats)
    }

    /// Drain every pending command (call at block start)
    pub fn process_commands(&mut self, rx: &mut rtrb::Consumer<EngineCommand>) {
        while let Ok(cmd) = rx.pop() {
            self.apply_command(cmd);
        }
    }

    pub fn apply_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Rotate { channel, axis, delta } => {
                self.channels[channel.index()].rotate(axis, delta);
            }
            EngineCommand::SetPosition { channel, axis, ticks } => {
                self.channels[channel.index()].set_position(axis, ticks);
            }
            EngineCommand::SetRecord(on) => self.controls.record = on,
            EngineCommand::SetTrackSwitch(on) => {
                if on && !self.controls.track_switch {
                    self.switcher.latch_press();
                }
                self.controls.track_switch = on;
            }
            EngineCommand::SetMix(mix) => {
                if mix.is_finite() {
                    self.controls.mix = mix.clamp(0.0, 1.0);
                }
            }
            EngineCommand::SelectSlot { channel, slot } => {
                self.channels[channel.index()].set_active_slot(slot % self.slot_count.max(1));
            }
        }
    }

    /// Render one block
    ///
    /// `output.len()` frames are produced. Live input shorter than the block
    /// is padded with silence and counted as underruns.
    pub fn process(&mut self, input: &[Sample], output: &mut [StereoSample]) {
        let block_len = output.len();
        let mut commits = 0u64;
        let mut clamped = 0u64;
        let mut polls = 0u64;
        let mut dropped = 0u64;

        for (n, frame) in output.iter_mut().enumerate() {
            let dry = input.get(n).copied().unwrap_or(0.0);

            let mut slots = [self.channels[0].active_slot(), self.channels[1].active_slot()];
            let event = self.switcher.update(
                self.controls.track_switch,
                self.controls.record,
                &mut slots,
                self.slot_count,
            );
            if event.any() {
                for (channel, slot) in self.channels.iter_mut().zip(slots) {
                    channel.set_active_slot(slot);
                }
            }

            for (idx, channel) in self.channels.iter_mut().enumerate() {
                let ctx = FrameContext {
                    n,
                    block_len,
                    input: dry,
                    recording: self.controls.record && self.record_channels[idx],
                    mix: self.controls.mix,
                };
                let result = channel.process_frame(&mut self.bank, &self.mapper, ctx);
                if let Some(outcome) = result.commit {
                    polls += 1;
                    commits += outcome.wrote() as u64;
                    clamped += outcome.clamped as u64;
                }
                dropped += result.dropped as u64;
                frame.set_channel(channel.id(), result.output);
            }
        }

        for channel in &self.channels {
            channel.publish();
        }
        let stats = &self.stats;
        EngineStats::add(&stats.polls, polls);
        EngineStats::add(&stats.commits, commits);
        EngineStats::add(&stats.clamped_intervals, clamped);
        EngineStats::add(&stats.dropped_capture, dropped);
        EngineStats::add(&stats.input_underruns, block_len.saturating_sub(input.len()) as u64);
    }
}

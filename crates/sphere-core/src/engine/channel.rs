//! Channel engine state
//!
//! One `ChannelState` per sphere. Each frame runs, in order: band mapping
//! (first frame of a block only), capture, poll/commit, playback. The bank
//! is passed in by the owning [`LooperEngine`](super::LooperEngine) so both
//! channels can share it.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::address::{AddressMapper, BandAddress};
use super::atomics::ChannelAtomics;
use super::bank::BufferBank;
use super::capture::CaptureQueue;
use super::motion::MotionTracker;
use super::player::{lerp, render_sample};
use super::recorder::{commit_window, CommitOutcome};
use crate::types::{Axis, ChannelId, Sample};

/// Levels and position of one frame within its block
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameContext {
    /// Frame index within the block
    pub n: usize,
    pub block_len: usize,
    pub input: Sample,
    /// Record-enable as seen by this channel (global level and per-channel enable)
    pub recording: bool,
    pub mix: f32,
}

/// What a channel did on one frame
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FrameResult {
    pub output: Sample,
    /// Set when a poll window closed on this frame
    pub commit: Option<CommitOutcome>,
    /// The capture queue was full
    pub dropped: bool,
}

pub struct ChannelState {
    id: ChannelId,
    active_slot: usize,
    tracker: MotionTracker,
    address: BandAddress,
    band_frac_prev: f32,
    capture: CaptureQueue,
    muted: bool,
    last_position: f32,
    atomics: Arc<ChannelAtomics>,
}

impl ChannelState {
    pub fn new(id: ChannelId, poll_frames: u32) -> Self {
        Self {
            id,
            active_slot: 0,
            tracker: MotionTracker::new(poll_frames),
            address: BandAddress::default(),
            band_frac_prev: 0.0,
            capture: CaptureQueue::with_capacity(poll_frames as usize),
            // Nothing has moved yet
            muted: true,
            last_position: 0.0,
            atomics: Arc::new(ChannelAtomics::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    #[inline]
    pub fn active_slot(&self) -> usize {
        self.active_slot
    }

    pub fn set_active_slot(&mut self, slot: usize) {
        self.active_slot = slot;
    }

    pub fn tracker(&self) -> &MotionTracker {
        &self.tracker
    }

    pub fn address(&self) -> BandAddress {
        self.address
    }

    pub fn band_frac_prev(&self) -> f32 {
        self.band_frac_prev
    }

    pub fn capture(&self) -> &CaptureQueue {
        &self.capture
    }

    /// Stationary at the last poll
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Playback position of the most recent frame
    pub fn last_position(&self) -> f32 {
        self.last_position
    }

    pub fn atomics(&self) -> Arc<ChannelAtomics> {
        Arc::clone(&self.atomics)
    }

    #[inline]
    pub fn rotate(&mut self, axis: Axis, delta: i64) {
        self.tracker.apply_delta(axis, delta);
    }

    #[inline]
    pub fn set_position(&mut self, axis: Axis, ticks: i64) {
        self.tracker.set_position(axis, ticks);
    }

    /// Run one audio frame
    pub(crate) fn process_frame(
        &mut self,
        bank: &mut BufferBank,
        mapper: &AddressMapper,
        ctx: FrameContext,
    ) -> FrameResult {
        let mut result = FrameResult::default();

        if ctx.n == 0 {
            self.band_frac_prev = self.address.frac;
            self.address = mapper.band_address(self.tracker.now(Axis::Y));
        }

        if ctx.recording {
            result.dropped = !self.capture.push(ctx.input);
        }

        if let Some(window) = self.tracker.advance_frame() {
            let interval = mapper.write_interval(window.now_x, window.x_delta);
            result.commit = Some(commit_window(
                bank,
                self.active_slot,
                self.address,
                &interval,
                &mut self.capture,
                ctx.recording,
            ));
            self.muted = !window.is_active();
        }

        let position = mapper.play_position(
            self.tracker.last(Axis::X),
            self.tracker.x_delta(),
            self.tracker.blend(),
        );
        let t = ctx.n as f32 / ctx.block_len.max(1) as f32;
        let address = self.address.with_frac(lerp(self.band_frac_prev, self.address.frac, t));

        result.output = render_sample(
            bank,
            self.active_slot,
            address,
            position,
            ctx.input,
            ctx.mix,
            self.muted,
        );
        self.last_position = position;
        result
    }

    /// Copy block-end state into the shared atomics
    pub(crate) fn publish(&self) {
        let a = &self.atomics;
        a.active_slot.store(self.active_slot, Ordering::Relaxed);
        a.band.store(self.address.band, Ordering::Relaxed);
        a.muted.store(self.muted, Ordering::Relaxed);
        a.x_delta.store(self.tracker.x_delta(), Ordering::Relaxed);
        a.set_position(self.last_position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LooperConfig;

    fn small_config() -> LooperConfig {
        LooperConfig {
            buffer_len: 720,
            band_count: 4,
            slot_count: 2,
            poll_frames: 8,
            samples_per_tick: 2,
            max_write_frames: 720,
            ..Default::default()
        }
    }

    fn ctx(n: usize, input: f32, recording: bool) -> FrameContext {
        FrameContext {
            n,
            block_len: 8,
            input,
            recording,
            mix: 0.5,
        }
    }

    #[test]
    fn test_starts_muted_with_dry_output() {
        let config = small_config();
        let mapper = AddressMapper::new(&config);
        let mut bank = BufferBank::silent(config.bank_shape()).unwrap();
        bank.band_mut(0, 0).fill(1.0);
        let mut channel = ChannelState::new(ChannelId::A, config.poll_frames);

        let result = channel.process_frame(&mut bank, &mapper, ctx(0, 0.4, false));
        assert!(channel.is_muted());
        assert_eq!(result.output, 0.2);
    }

    #[test]
    fn test_band_snapshot_only_at_block_start() {
        let config = small_config();
        let mapper = AddressMapper::new(&config);
        let mut bank = BufferBank::silent(config.bank_shape()).unwrap();
        let mut channel = ChannelState::new(ChannelId::A, config.poll_frames);

        channel.rotate(Axis::Y, 6); // 6 / 4 = 1.5
        channel.process_frame(&mut bank, &mapper, ctx(0, 0.0, false));
        assert_eq!(channel.address().band, 1);
        assert_eq!(channel.address().frac, 0.5);

        channel.rotate(Axis::Y, 1);
        channel.process_frame(&mut bank, &mapper, ctx(1, 0.0, false));
        assert_eq!(channel.address().frac, 0.5);

        channel.process_frame(&mut bank, &mapper, ctx(0, 0.0, false));
        assert_eq!(channel.band_frac_prev(), 0.5);
        assert_eq!(channel.address().frac, 0.75);
    }

    #[test]
    fn test_queue_bound_at_commit() {
        let config = small_config();
        let mapper = AddressMapper::new(&config);
        let mut bank = BufferBank::silent(config.bank_shape()).unwrap();
        let mut channel = ChannelState::new(ChannelId::A, config.poll_frames);

        for frame in 0..64 {
            let n = frame % 8;
            channel.rotate(Axis::X, 1);
            let before = channel.capture().len();
            let result = channel.process_frame(&mut bank, &mapper, ctx(n, 0.1, true));
            assert!(!result.dropped);
            assert!(before < config.poll_frames as usize);
            if result.commit.is_some() {
                assert!(channel.capture().is_empty());
            }
        }
    }

    #[test]
    fn test_commit_unmutes_and_writes_active_slot() {
        let config = small_config();
        let mapper = AddressMapper::new(&config);
        let mut bank = BufferBank::silent(config.bank_shape()).unwrap();
        let mut channel = ChannelState::new(ChannelId::B, config.poll_frames);
        channel.set_active_slot(1);
        channel.rotate(Axis::X, 4);

        let mut commits = 0;
        for n in 0..8 {
            if let Some(outcome) = channel
                .process_frame(&mut bank, &mapper, ctx(n, 0.5, true))
                .commit
            {
                assert_eq!(outcome.written, 8);
                commits += 1;
            }
        }
        assert_eq!(commits, 1);
        assert!(!channel.is_muted());
        // anchor = 4 * 2
        assert_eq!(&bank.band(1, 0)[8..16], &[0.5; 8]);
        assert!(bank.band(0, 0).iter().all(|s| *s == 0.0));

        channel.publish();
        let atomics = channel.atomics();
        assert_eq!(atomics.active_slot(), 1);
        assert_eq!(atomics.x_delta(), 4);
        assert!(!atomics.is_muted());
    }
}

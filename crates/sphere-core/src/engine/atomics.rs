//! Lock-free state published by the audio thread
//!
//! The control thread reads these to log status without touching the
//! engine. All operations use `Ordering::Relaxed`: observers only need
//! eventual visibility, not synchronization with other memory.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Per-channel state snapshot
pub struct ChannelAtomics {
    /// Slot the channel currently records into and plays from
    pub active_slot: AtomicUsize,
    /// Primary band at the last block start
    pub band: AtomicUsize,
    /// True while the last poll saw no X motion
    pub muted: AtomicBool,
    /// X delta of the last poll
    pub x_delta: AtomicI64,
    /// Playback position at the end of the last block, as f32 bits
    position_bits: AtomicU32,
}

impl ChannelAtomics {
    pub fn new() -> Self {
        Self {
            active_slot: AtomicUsize::new(0),
            band: AtomicUsize::new(0),
            muted: AtomicBool::new(true),
            x_delta: AtomicI64::new(0),
            position_bits: AtomicU32::new(0.0f32.to_bits()),
        }
    }

    #[inline]
    pub fn active_slot(&self) -> usize {
        self.active_slot.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn band(&self) -> usize {
        self.band.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn x_delta(&self) -> i64 {
        self.x_delta.load(Ordering::Relaxed)
    }

    /// Playback position in samples
    #[inline]
    pub fn position(&self) -> f32 {
        f32::from_bits(self.position_bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_position(&self, position: f32) {
        self.position_bits.store(position.to_bits(), Ordering::Relaxed);
    }
}

impl Default for ChannelAtomics {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine-wide counters
#[derive(Default)]
pub struct EngineStats {
    /// Poll windows closed (summed over channels)
    pub polls: AtomicU64,
    /// Commits that wrote to the bank
    pub commits: AtomicU64,
    /// Commits shortened to `max_write_frames`
    pub clamped_intervals: AtomicU64,
    /// Capture pushes rejected by a full queue
    pub dropped_capture: AtomicU64,
    /// Output frames rendered without a live input sample available
    pub input_underruns: AtomicU64,
}

/// Plain copy of [`EngineStats`] for logging and comparisons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub polls: u64,
    pub commits: u64,
    pub clamped_intervals: u64,
    pub dropped_capture: u64,
    pub input_underruns: u64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(counter: &AtomicU64, n: u64) {
        if n > 0 {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            polls: self.polls.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            clamped_intervals: self.clamped_intervals.load(Ordering::Relaxed),
            dropped_capture: self.dropped_capture.load(Ordering::Relaxed),
            input_underruns: self.input_underruns.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_atomics_defaults() {
        let atomics = ChannelAtomics::new();
        assert!(atomics.is_muted());
        assert_eq!(atomics.active_slot(), 0);
        assert_eq!(atomics.position(), 0.0);
    }

    #[test]
    fn test_position_roundtrips_f32() {
        let atomics = ChannelAtomics::new();
        atomics.set_position(22_050.25);
        assert_eq!(atomics.position(), 22_050.25);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = EngineStats::new();
        EngineStats::add(&stats.commits, 3);
        EngineStats::add(&stats.dropped_capture, 0);
        let snap = stats.snapshot();
        assert_eq!(snap.commits, 3);
        assert_eq!(snap.dropped_capture, 0);
    }
}

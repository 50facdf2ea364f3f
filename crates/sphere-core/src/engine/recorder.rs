//! Poll-window recorder
//!
//! At each poll the captured input is stretched across the write interval
//! and crossfaded into the `band`/`fade_band` pair of the active slot. Each
//! target offset mixes the new sample with what the band already held:
//!
//! ```text
//! band[o]      = in * (1 - frac) + band[o]      * frac
//! fade_band[o] = in * frac       + fade_band[o] * (1 - frac)
//! ```
//!
//! The input weights across the two bands sum to one. The capture queue is
//! cleared whether or not anything was written.

use super::address::{crossfade_weights, BandAddress, WriteInterval};
use super::bank::BufferBank;
use super::capture::CaptureQueue;

/// What one commit did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Samples written per band
    pub written: usize,
    /// The interval was shortened to `max_write_frames`
    pub clamped: bool,
}

impl CommitOutcome {
    pub fn wrote(&self) -> bool {
        self.written > 0
    }
}

/// Commit one poll window of captured input into `slot`
///
/// Writes only when `armed` and the interval is non-empty and the queue
/// holds at least one sample. Always clears `queue`.
pub fn commit_window(
    bank: &mut BufferBank,
    slot: usize,
    address: BandAddress,
    interval: &WriteInterval,
    queue: &mut CaptureQueue,
    armed: bool,
) -> CommitOutcome {
    let outcome = if armed && !interval.is_empty() && !queue.is_empty() {
        write_interval(bank, slot, address, interval, queue);
        CommitOutcome {
            written: interval.len,
            clamped: interval.clamped,
        }
    } else {
        CommitOutcome::default()
    };
    queue.clear();
    outcome
}

fn write_interval(
    bank: &mut BufferBank,
    slot: usize,
    address: BandAddress,
    interval: &WriteInterval,
    queue: &CaptureQueue,
) {
    let (near, far) = crossfade_weights(address.frac);

    for i in 0..interval.len {
        let Some(input) = queue.sample_for(i, interval.len) else {
            return;
        };
        let offset = interval.offset(i);

        if address.is_degenerate() {
            bank.set(slot, address.band, offset, input);
            continue;
        }

        let prior = bank.get(slot, address.band, offset);
        bank.set(slot, address.band, offset, input * near + prior * far);

        let prior = bank.get(slot, address.fade_band, offset);
        bank.set(slot, address.fade_band, offset, input * far + prior * near);
    }
}

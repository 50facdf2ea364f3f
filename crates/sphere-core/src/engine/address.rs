//! Spherical address mapping
//!
//! Converts absolute tick counts into buffer-bank coordinates:
//!
//! - **Y → band (latitude)**: the antipodally normalized angle divided by
//!   `degrees_per_band` gives a continuous band coordinate. Its integer part
//!   selects `band`, the next band up (wrapping) is `fade_band`, and the
//!   fractional part is the crossfade amount between them.
//! - **X → position (longitude)**: the Euclidean-normalized angle times
//!   `samples_per_tick` anchors the head inside the band buffer; a poll
//!   window's X delta spans `|delta| * samples_per_tick` samples from there.
//!
//! All results are total over `i64` tick input.

use super::angle::{normalize_angle, wrap_position, WrapPolicy};
use crate::config::LooperConfig;

/// Gains for (`band`, `fade_band`) at a given crossfade amount
///
/// The pair always sums to one, so a stationary Y position never bleeds
/// into the neighbouring band.
#[inline]
pub fn crossfade_weights(frac: f32) -> (f32, f32) {
    let frac = frac.clamp(0.0, 1.0);
    (1.0 - frac, frac)
}

/// Band coordinates for one Y position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandAddress {
    pub band: usize,
    /// `(band + 1) mod band_count`
    pub fade_band: usize,
    /// Crossfade toward `fade_band`, in `[0, 1)`
    pub frac: f32,
}

impl BandAddress {
    /// Same bands, different crossfade amount
    #[inline]
    pub fn with_frac(self, frac: f32) -> Self {
        Self { frac, ..self }
    }

    /// True when the bank has a single band and both sides alias
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.band == self.fade_band
    }
}

impl Default for BandAddress {
    fn default() -> Self {
        Self {
            band: 0,
            fade_band: 0,
            frac: 0.0,
        }
    }
}

/// Buffer span covered by one poll window of X motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteInterval {
    /// First offset written (the anchor)
    pub start: usize,
    /// Number of samples in the span
    pub len: usize,
    /// Write downward from `start`, wrapping below zero
    pub reverse: bool,
    /// The motion asked for more than `max_write_frames`
    pub clamped: bool,
    buffer_len: usize,
}

impl WriteInterval {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffer offset of the `i`-th write, in write order
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        debug_assert!(i < self.len);
        if self.reverse {
            (self.start + self.buffer_len - i % self.buffer_len) % self.buffer_len
        } else {
            (self.start + i) % self.buffer_len
        }
    }

    /// All offsets in write order
    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).map(move |i| self.offset(i))
    }
}

/// Maps tick counts to bank coordinates for one bank geometry
#[derive(Debug, Clone)]
pub struct AddressMapper {
    band_count: usize,
    degrees_per_band: f32,
    buffer_len: usize,
    samples_per_tick: usize,
    max_write_frames: usize,
    phase_offset: f32,
}

impl AddressMapper {
    pub fn new(config: &LooperConfig) -> Self {
        Self {
            band_count: config.band_count.max(1),
            degrees_per_band: config.degrees_per_band.max(1) as f32,
            buffer_len: config.buffer_len.max(1),
            samples_per_tick: config.samples_per_tick as usize,
            max_write_frames: config.max_write_frames.min(config.buffer_len),
            phase_offset: config.phase_offset(),
        }
    }

    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    #[inline]
    pub fn band_count(&self) -> usize {
        self.band_count
    }

    /// Band pair and crossfade for an absolute Y tick count
    pub fn band_address(&self, now_y: i64) -> BandAddress {
        let angle = normalize_angle(now_y, WrapPolicy::Antipodal) as f32;
        let coordinate = angle / self.degrees_per_band;
        let whole = coordinate.floor();
        let band = (whole as usize) % self.band_count;
        BandAddress {
            band,
            fade_band: (band + 1) % self.band_count,
            frac: coordinate - whole,
        }
    }

    /// Buffer offset a given X tick count points at
    #[inline]
    pub fn anchor(&self, x_ticks: i64) -> usize {
        let angle = normalize_angle(x_ticks, WrapPolicy::Euclidean) as usize;
        (angle * self.samples_per_tick) % self.buffer_len
    }

    /// Span to record for a window ending at `now_x` after `x_delta` ticks
    pub fn write_interval(&self, now_x: i64, x_delta: i64) -> WriteInterval {
        let requested = (x_delta.unsigned_abs() as u128) * (self.samples_per_tick as u128);
        let clamped = requested > self.max_write_frames as u128;
        let len = if clamped {
            self.max_write_frames
        } else {
            requested as usize
        };
        WriteInterval {
            start: self.anchor(now_x),
            len,
            reverse: x_delta < 0,
            clamped,
            buffer_len: self.buffer_len,
        }
    }

    /// Record head position `blend` of the way from `base_x` toward `base_x + x_delta`
    pub fn head_position(&self, base_x: i64, x_delta: i64, blend: f32) -> f32 {
        let start = self.anchor(base_x) as f32;
        let span = x_delta as f32 * self.samples_per_tick as f32;
        wrap_position(start + span * blend, self.buffer_len)
    }

    /// Playback position: the record head shifted by half a buffer
    pub fn play_position(&self, base_x: i64, x_delta: i64, blend: f32) -> f32 {
        let head = self.head_position(base_x, x_delta, blend);
        wrap_position(head + self.phase_offset, self.buffer_len)
    }

    #[inline]
    pub fn phase_offset(&self) -> f32 {
        self.phase_offset
    }
}

//! Per-sample playback
//!
//! The read is interpolated in two dimensions: linearly between the two
//! offsets bracketing the fractional position, then across the
//! `band`/`fade_band` pair with the crossfade weights. The wet result is
//! mixed against the live input by the dry ratio.

use super::address::{crossfade_weights, BandAddress};
use super::bank::BufferBank;
use crate::types::Sample;

/// Linear interpolation between `from` and `to`
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Read one band at a fractional position, wrapping at the buffer end
#[inline]
pub fn read_interpolated(bank: &BufferBank, slot: usize, band: usize, position: f32) -> Sample {
    let len = bank.buffer_len();
    let floor = position.floor();
    let t = position - floor;
    let i0 = (floor as usize) % len;
    let i1 = (i0 + 1) % len;
    lerp(bank.get(slot, band, i0), bank.get(slot, band, i1), t)
}

/// Read the band pair of `address` at a fractional position
#[inline]
pub fn read_crossfaded(bank: &BufferBank, slot: usize, address: BandAddress, position: f32) -> Sample {
    let near = read_interpolated(bank, slot, address.band, position);
    if address.is_degenerate() {
        return near;
    }
    let far = read_interpolated(bank, slot, address.fade_band, position);
    let (w_near, w_far) = crossfade_weights(address.frac);
    near * w_near + far * w_far
}

/// Dry/wet mix; `mix` is the dry ratio
#[inline]
pub fn mix_dry_wet(wet: Sample, dry: Sample, mix: f32) -> Sample {
    wet * (1.0 - mix) + dry * mix
}

/// One output sample for a channel
///
/// A muted channel skips the bank entirely and returns `dry * mix`.
#[inline]
pub fn render_sample(
    bank: &BufferBank,
    slot: usize,
    address: BandAddress,
    position: f32,
    dry: Sample,
    mix: f32,
    muted: bool,
) -> Sample {
    if muted {
        return dry * mix;
    }
    let wet = read_crossfaded(bank, slot, address, position);
    mix_dry_wet(wet, dry, mix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bank::BankShape;

    fn ramp_bank() -> BufferBank {
        let mut bank = BufferBank::silent(BankShape { slots: 1, bands: 3, len: 8 }).unwrap();
        for (i, s) in bank.band_mut(0, 0).iter_mut().enumerate() {
            *s = i as f32;
        }
        bank.band_mut(0, 1).fill(10.0);
        bank.band_mut(0, 2).fill(-4.0);
        bank
    }

    #[test]
    fn test_linear_read_between_offsets() {
        let bank = ramp_bank();
        assert_eq!(read_interpolated(&bank, 0, 0, 2.0), 2.0);
        assert_eq!(read_interpolated(&bank, 0, 0, 2.25), 2.25);
        // Between the last offset and offset 0
        assert_eq!(read_interpolated(&bank, 0, 0, 7.5), 3.5);
    }

    #[test]
    fn test_band_crossfade_read() {
        let bank = ramp_bank();
        let address = BandAddress { band: 1, fade_band: 2, frac: 0.25 };
        let value = read_crossfaded(&bank, 0, address, 3.0);
        // 10 * 0.75 + -4 * 0.25
        assert!((value - 6.5).abs() < 1e-6);

        let degenerate = BandAddress { band: 1, fade_band: 1, frac: 0.5 };
        assert_eq!(read_crossfaded(&bank, 0, degenerate, 3.0), 10.0);
    }

    #[test]
    fn test_mix_extremes() {
        assert_eq!(mix_dry_wet(1.0, 0.5, 0.0), 1.0);
        assert_eq!(mix_dry_wet(1.0, 0.5, 1.0), 0.5);
        assert!((mix_dry_wet(1.0, 0.5, 0.75) - 0.625).abs() < 1e-6);
    }

    #[test]
    fn test_muted_ignores_bank() {
        let bank = ramp_bank();
        let address = BandAddress { band: 1, fade_band: 2, frac: 0.0 };
        assert_eq!(render_sample(&bank, 0, address, 3.0, 0.8, 0.75, true), 0.8 * 0.75);
        let live = render_sample(&bank, 0, address, 3.0, 0.8, 0.75, false);
        assert!((live - (10.0 * 0.25 + 0.8 * 0.75)).abs() < 1e-6);
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(0.2, 0.6, 0.0), 0.2);
        assert!((lerp(0.2, 0.6, 0.5) - 0.4).abs() < 1e-6);
    }
}

//! Post filter - fixed HP then LP on both channel outputs

use crate::config::PostFilterConfig;
use crate::types::StereoSample;

/// Filter response taken from the state-variable outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    LowPass,
    HighPass,
}

/// Two-pole (12dB/octave) state-variable filter, stereo
#[derive(Debug, Clone)]
pub struct SvfFilter {
    mode: FilterMode,
    // State per channel
    ic1eq_l: f32,
    ic2eq_l: f32,
    ic1eq_r: f32,
    ic2eq_r: f32,
    // Coefficients
    g: f32,
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,
}

impl SvfFilter {
    pub fn new(mode: FilterMode, cutoff: f32, q: f32, sample_rate: u32) -> Self {
        let mut f = Self {
            mode,
            ic1eq_l: 0.0,
            ic2eq_l: 0.0,
            ic1eq_r: 0.0,
            ic2eq_r: 0.0,
            g: 0.0,
            k: 0.0,
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
        };
        f.set_params(cutoff, q, sample_rate);
        f
    }

    pub fn set_params(&mut self, cutoff: f32, q: f32, sample_rate: u32) {
        let sample_rate = sample_rate.max(1) as f32;
        // Stay below Nyquist so tan() stays finite
        let cutoff = cutoff.clamp(20.0, sample_rate * 0.45);
        let q = q.clamp(0.1, 10.0);

        self.g = (std::f32::consts::PI * cutoff / sample_rate).tan();
        self.k = 1.0 / q;
        self.a1 = 1.0 / (1.0 + self.g * (self.g + self.k));
        self.a2 = self.g * self.a1;
        self.a3 = self.g * self.a2;
    }

    #[inline]
    fn tick(&self, input: f32, ic1eq: &mut f32, ic2eq: &mut f32) -> f32 {
        let v3 = input - *ic2eq;
        let v1 = self.a1 * *ic1eq + self.a2 * v3;
        let v2 = *ic2eq + self.a2 * *ic1eq + self.a3 * v3;
        *ic1eq = 2.0 * v1 - *ic1eq;
        *ic2eq = 2.0 * v2 - *ic2eq;

        match self.mode {
            FilterMode::LowPass => v2,
            FilterMode::HighPass => input - self.k * v1 - v2,
        }
    }

    /// Filter one stereo frame in place
    #[inline]
    pub fn process(&mut self, frame: &mut StereoSample) {
        let (mut c1, mut c2) = (self.ic1eq_l, self.ic2eq_l);
        frame.left = self.tick(frame.left, &mut c1, &mut c2);
        self.ic1eq_l = c1;
        self.ic2eq_l = c2;

        let (mut c1, mut c2) = (self.ic1eq_r, self.ic2eq_r);
        frame.right = self.tick(frame.right, &mut c1, &mut c2);
        self.ic1eq_r = c1;
        self.ic2eq_r = c2;
    }

    pub fn reset(&mut self) {
        self.ic1eq_l = 0.0;
        self.ic2eq_l = 0.0;
        self.ic1eq_r = 0.0;
        self.ic2eq_r = 0.0;
    }
}

/// High-pass followed by low-pass, channels filtered independently
#[derive(Debug, Clone)]
pub struct PostFilter {
    enabled: bool,
    highpass: SvfFilter,
    lowpass: SvfFilter,
}

impl PostFilter {
    pub fn new(config: &PostFilterConfig, sample_rate: u32) -> Self {
        Self {
            enabled: config.enabled,
            highpass: SvfFilter::new(
                FilterMode::HighPass,
                config.highpass_hz,
                config.highpass_q,
                sample_rate,
            ),
            lowpass: SvfFilter::new(
                FilterMode::LowPass,
                config.lowpass_hz,
                config.lowpass_q,
                sample_rate,
            ),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn process(&mut self, frames: &mut [StereoSample]) {
        if !self.enabled {
            return;
        }
        for frame in frames.iter_mut() {
            self.highpass.process(frame);
            self.lowpass.process(frame);
        }
    }

    pub fn reset(&mut self) {
        self.highpass.reset();
        self.lowpass.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44_100;

    fn sine(freq: f32, len: usize) -> Vec<StereoSample> {
        (0..len)
            .map(|i| {
                let s = (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin();
                StereoSample::new(s, s)
            })
            .collect()
    }

    fn tail_peak(frames: &[StereoSample]) -> f32 {
        frames[frames.len() / 2..]
            .iter()
            .map(|f| f.left.abs().max(f.right.abs()))
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_passes_midband() {
        let mut filter = PostFilter::new(&PostFilterConfig::default(), SR);
        let mut frames = sine(2000.0, 8192);
        filter.process(&mut frames);
        assert!(tail_peak(&frames) > 0.7);
    }

    #[test]
    fn test_attenuates_lows_and_highs() {
        let mut filter = PostFilter::new(&PostFilterConfig::default(), SR);
        let mut low = sine(50.0, 16_384);
        filter.process(&mut low);
        assert!(tail_peak(&low) < 0.1);

        filter.reset();
        let mut high = sine(18_000.0, 8192);
        filter.process(&mut high);
        assert!(tail_peak(&high) < 0.25);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut filter = PostFilter::new(&PostFilterConfig::default(), SR);
        let mut frames: Vec<StereoSample> = sine(2000.0, 1024)
            .into_iter()
            .map(|f| StereoSample::new(f.left, 0.0))
            .collect();
        filter.process(&mut frames);
        assert!(frames.iter().all(|f| f.right == 0.0));
    }

    #[test]
    fn test_disabled_is_bypass() {
        let config = PostFilterConfig {
            enabled: false,
            ..Default::default()
        };
        let mut filter = PostFilter::new(&config, SR);
        let mut frames = sine(50.0, 64);
        let original = frames.clone();
        filter.process(&mut frames);
        assert_eq!(frames, original);
    }

    #[test]
    fn test_cutoff_above_nyquist_stays_finite() {
        let mut filter = SvfFilter::new(FilterMode::LowPass, 40_000.0, 2.0, 22_050);
        let mut frame = StereoSample::new(1.0, -1.0);
        for _ in 0..64 {
            filter.process(&mut frame);
            assert!(frame.left.is_finite() && frame.right.is_finite());
        }
    }
}

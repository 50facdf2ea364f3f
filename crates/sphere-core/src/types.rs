//! Common types for the looper
//!
//! Sample and frame types shared by the engine, the audio backend and the
//! controller crate. Channel A is always rendered to the left output and
//! channel B to the right.

use serde::{Deserialize, Serialize};

/// Number of channel engines (one per sphere)
pub const NUM_CHANNELS: usize = 2;

/// Audio sample type (32-bit float throughout the engine)
pub type Sample = f32;

/// Identifies one of the two channel engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(usize)]
pub enum ChannelId {
    A = 0,
    B = 1,
}

impl ChannelId {
    /// Both channels in output order
    pub const ALL: [ChannelId; NUM_CHANNELS] = [ChannelId::A, ChannelId::B];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChannelId::A => "A",
            ChannelId::B => "B",
        }
    }
}

/// Controller axis
///
/// X is longitude (position inside a band buffer), Y is latitude (band selection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Control levels held for one audio frame
///
/// The engine consumes one of these per frame alongside the live input sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlFrame {
    /// Record-enable level
    pub record: bool,
    /// Track-switch level (edges are detected by the engine)
    pub track_switch: bool,
    /// Dry ratio in [0, 1]: 0.0 = fully wet, 1.0 = fully dry
    pub mix: f32,
}

impl Default for ControlFrame {
    fn default() -> Self {
        Self {
            record: false,
            track_switch: false,
            mix: 0.75,
        }
    }
}

/// A single stereo output frame (channel A left, channel B right)
///
/// Uses `#[repr(C)]` so `&[StereoSample]` can be viewed as interleaved
/// `&[f32]` through bytemuck without copying.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Route a channel engine's sample to its output side
    #[inline]
    pub fn set_channel(&mut self, channel: ChannelId, value: Sample) {
        match channel {
            ChannelId::A => self.left = value,
            ChannelId::B => self.right = value,
        }
    }
}

/// A buffer of stereo output frames
///
/// Pre-allocated once with [`StereoBuffer::silence`] and resized within its
/// capacity on the audio thread with [`StereoBuffer::set_len_from_capacity`].
#[derive(Debug, Clone)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// Create a buffer filled with silence
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![StereoSample::silence(); len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Set the working length of a pre-allocated buffer (real-time safe)
    ///
    /// Fills any newly exposed elements with silence. Never allocates as long
    /// as `new_len` does not exceed the capacity reserved at construction.
    #[inline]
    pub fn set_len_from_capacity(&mut self, new_len: usize) {
        let current_len = self.samples.len();
        if new_len > current_len {
            debug_assert!(
                new_len <= self.samples.capacity(),
                "set_len_from_capacity called with len > capacity"
            );
            self.samples.resize(new_len, StereoSample::silence());
        } else {
            self.samples.truncate(new_len);
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[StereoSample] {
        &self.samples
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// Zero-copy view as interleaved f32 [A, B, A, B, ...]
    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        bytemuck::cast_slice(&self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_index_matches_output_order() {
        for (i, ch) in ChannelId::ALL.into_iter().enumerate() {
            assert_eq!(ch.index(), i);
        }
        assert_eq!(ChannelId::B.name(), "B");
    }

    #[test]
    fn test_stereo_sample_channel_routing() {
        let mut s = StereoSample::silence();
        s.set_channel(ChannelId::A, 0.25);
        s.set_channel(ChannelId::B, -0.5);
        assert_eq!(s.left, 0.25);
        assert_eq!(s.right, -0.5);
    }

    #[test]
    fn test_buffer_interleaved_view() {
        let mut buf = StereoBuffer::silence(2);
        buf.as_mut_slice()[0] = StereoSample::new(1.0, 2.0);
        buf.as_mut_slice()[1] = StereoSample::new(3.0, 4.0);
        assert_eq!(buf.as_interleaved(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_set_len_from_capacity_keeps_capacity() {
        let mut buf = StereoBuffer::silence(64);
        buf.set_len_from_capacity(16);
        assert_eq!(buf.len(), 16);
        buf.set_len_from_capacity(64);
        assert_eq!(buf.len(), 64);
        assert!(buf.as_slice().iter().all(|s| *s == StereoSample::silence()));
    }
}

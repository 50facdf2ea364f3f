//! Looper configuration
//!
//! Every tunable the engine depends on lives in [`LooperConfig`]: buffer
//! geometry, the tick-to-sample scale, the poll cadence and the post filter.
//! Components receive the validated struct (or values derived from it) at
//! construction and never read free-standing constants.
//!
//! # Units
//!
//! | Field              | Unit                                   |
//! |--------------------|----------------------------------------|
//! | `sample_rate`      | Hz                                     |
//! | `buffer_len`       | samples per (slot, band) buffer        |
//! | `degrees_per_band` | pseudo-degrees of Y rotation per band  |
//! | `poll_frames`      | audio frames per poll window           |
//! | `samples_per_tick` | buffer samples per X encoder tick      |
//! | `max_write_frames` | samples written by one commit, at most |
//! | `default_mix`      | dry ratio, 0.0 (wet) to 1.0 (dry)      |
//!
//! # Usage
//!
//! ```ignore
//! use sphere_core::config::{load_config, default_config_path, LooperConfig};
//!
//! let config: LooperConfig = load_config(&default_config_path("looper.yaml"));
//! config.validate()?;
//! ```

mod io;
mod paths;

pub use io::{load_config, save_config};
pub use paths::{default_config_path, default_looper_dir};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::AudioConfig;
use crate::engine::BankShape;
use crate::types::NUM_CHANNELS;

/// Errors reported by [`LooperConfig::validate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("buffer_len must be at least 2 samples, got {0}")]
    BufferTooShort(usize),

    #[error("max_write_frames must be in 1..={buffer_len}, got {value}")]
    WriteClampOutOfRange { value: usize, buffer_len: usize },

    #[error("default_mix must be within [0, 1], got {0}")]
    MixOutOfRange(f32),

    #[error("post filter {field} must be positive, got {value}")]
    FilterParam { field: &'static str, value: f32 },

    #[error("bank lists {files} files but slot_count is {slots}")]
    NotEnoughFiles { files: usize, slots: usize },
}

/// Post-processing filter applied to both channel outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFilterConfig {
    pub enabled: bool,
    pub highpass_hz: f32,
    pub highpass_q: f32,
    pub lowpass_hz: f32,
    pub lowpass_q: f32,
}

impl Default for PostFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            highpass_hz: 500.0,
            highpass_q: 1.0,
            lowpass_hz: 8000.0,
            lowpass_q: 2.0,
        }
    }
}

/// Where the startup loader finds the source audio for each slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankSourceConfig {
    /// Directory holding the slot files
    pub directory: PathBuf,
    /// One file per slot, in slot order
    pub files: Vec<String>,
    /// Source channel to load (taken modulo the file's channel count)
    pub channel: usize,
}

impl Default for BankSourceConfig {
    fn default() -> Self {
        Self {
            directory: default_looper_dir().join("samples"),
            files: (1..=10).map(|i| format!("{:02}.aif", i)).collect(),
            channel: 0,
        }
    }
}

impl BankSourceConfig {
    /// Full path of the file feeding `slot`
    pub fn path_for_slot(&self, slot: usize) -> Option<PathBuf> {
        self.files.get(slot).map(|f| self.directory.join(f))
    }
}

/// Complete looper configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooperConfig {
    pub sample_rate: u32,
    pub buffer_len: usize,
    pub band_count: usize,
    pub slot_count: usize,
    pub degrees_per_band: u32,
    /// Poll window length (`sumFrames`)
    pub poll_frames: u32,
    /// X-axis scale, also the number of samples written per tick of motion
    pub samples_per_tick: u32,
    pub max_write_frames: usize,
    pub default_mix: f32,
    /// Which channel engines honor record-enable, indexed by channel
    pub record_channels: [bool; NUM_CHANNELS],
    pub post_filter: PostFilterConfig,
    pub bank: BankSourceConfig,
    pub audio: AudioConfig,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            buffer_len: 44_100,
            band_count: 90,
            slot_count: 10,
            degrees_per_band: 4,
            poll_frames: 1024,
            samples_per_tick: 128,
            max_write_frames: 44_100,
            default_mix: 0.75,
            record_channels: [true; NUM_CHANNELS],
            post_filter: PostFilterConfig::default(),
            bank: BankSourceConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl LooperConfig {
    /// Check every invariant the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts: [(&'static str, usize); 6] = [
            ("sample_rate", self.sample_rate as usize),
            ("band_count", self.band_count),
            ("slot_count", self.slot_count),
            ("degrees_per_band", self.degrees_per_band as usize),
            ("poll_frames", self.poll_frames as usize),
            ("samples_per_tick", self.samples_per_tick as usize),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }

        if self.buffer_len < 2 {
            return Err(ConfigError::BufferTooShort(self.buffer_len));
        }
        if self.max_write_frames == 0 || self.max_write_frames > self.buffer_len {
            return Err(ConfigError::WriteClampOutOfRange {
                value: self.max_write_frames,
                buffer_len: self.buffer_len,
            });
        }
        if !(0.0..=1.0).contains(&self.default_mix) {
            return Err(ConfigError::MixOutOfRange(self.default_mix));
        }

        let pf = &self.post_filter;
        let filter_params = [
            ("highpass_hz", pf.highpass_hz),
            ("highpass_q", pf.highpass_q),
            ("lowpass_hz", pf.lowpass_hz),
            ("lowpass_q", pf.lowpass_q),
        ];
        for (field, value) in filter_params {
            // NaN fails this comparison too
            if !(value > 0.0) {
                return Err(ConfigError::FilterParam { field, value });
            }
        }

        if self.bank.files.len() < self.slot_count {
            return Err(ConfigError::NotEnoughFiles {
                files: self.bank.files.len(),
                slots: self.slot_count,
            });
        }

        Ok(())
    }

    /// Fixed distance between record and playback heads: half a buffer
    pub fn phase_offset(&self) -> f32 {
        self.buffer_len as f32 / 2.0
    }

    /// Geometry of the buffer bank this config describes
    pub fn bank_shape(&self) -> BankShape {
        BankShape {
            slots: self.slot_count,
            bands: self.band_count,
            len: self.buffer_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LooperConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.phase_offset(), 22_050.0);
        assert_eq!(config.bank.files.len(), 10);
        assert_eq!(config.bank.files[9], "10.aif");
    }

    #[test]
    fn test_rejects_zero_poll_frames() {
        let config = LooperConfig {
            poll_frames: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero { field: "poll_frames" })
        );
    }

    #[test]
    fn test_rejects_write_clamp_beyond_buffer() {
        let config = LooperConfig {
            buffer_len: 1000,
            max_write_frames: 1001,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WriteClampOutOfRange { value: 1001, buffer_len: 1000 })
        ));
    }

    #[test]
    fn test_rejects_mix_and_filter_out_of_range() {
        let config = LooperConfig {
            default_mix: 1.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MixOutOfRange(1.5)));

        let mut config = LooperConfig::default();
        config.post_filter.lowpass_q = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FilterParam { field: "lowpass_q", .. })
        ));
    }

    #[test]
    fn test_rejects_missing_slot_files() {
        let mut config = LooperConfig::default();
        config.bank.files.truncate(3);
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotEnoughFiles { files: 3, slots: 10 })
        );
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "buffer_len: 8000\npoll_frames: 256\npost_filter:\n  enabled: false\n";
        let config: LooperConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.buffer_len, 8000);
        assert_eq!(config.poll_frames, 256);
        assert!(!config.post_filter.enabled);
        assert_eq!(config.post_filter.lowpass_hz, 8000.0);
        assert_eq!(config.band_count, 90);
    }
}

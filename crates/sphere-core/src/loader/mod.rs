//! Startup bank loader
//!
//! Decodes one audio file per slot with symphonia and slices it into bands:
//! band `i` of a slot receives source frames `[i * buffer_len, (i + 1) * buffer_len)`
//! of the configured channel. Every (slot, band) cell must be filled before
//! the bank is handed to the engine, so any shortfall is an error here
//! rather than silence later.

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::LooperConfig;
use crate::engine::{BankBuilder, BankError, BufferBank};
use crate::types::Sample;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("no source file configured for slot {slot}")]
    MissingSource { slot: usize },

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported audio in {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("{path} has {frames} frames, {required} needed to fill every band")]
    TooShort {
        path: PathBuf,
        frames: usize,
        required: usize,
    },

    #[error(transparent)]
    Bank(#[from] BankError),
}

/// One decoded channel of a source file
#[derive(Debug, Clone)]
pub struct DecodedSource {
    pub samples: Vec<Sample>,
    pub sample_rate: u32,
    /// Channel count of the file (before extraction)
    pub channels: usize,
}

/// Decode a file and keep one channel (taken modulo the channel count)
pub fn decode_mono(path: &Path, channel: usize) -> Result<DecodedSource, LoaderError> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let unsupported = |reason: String| LoaderError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| LoaderError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| unsupported(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| unsupported("no audio track found".to_string()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| unsupported("unknown sample rate".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1)
        .max(1);
    let pick = channel % channels;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| unsupported(e.to_string()))?;

    let mut samples: Vec<Sample> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet from {:?}: {}", path, e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("Error decoding packet from {:?}: {}", path, e);
                continue;
            }
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::new(duration, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend(buf.samples().iter().skip(pick).step_by(channels));
        }
    }

    Ok(DecodedSource {
        samples,
        sample_rate,
        channels,
    })
}

/// Slice one decoded source into every band of `slot`
pub fn fill_slot(
    builder: &mut BankBuilder,
    slot: usize,
    path: &Path,
    samples: &[Sample],
) -> Result<(), LoaderError> {
    let shape = builder.shape();
    let required = shape.bands * shape.len;
    if samples.len() < required {
        return Err(LoaderError::TooShort {
            path: path.to_path_buf(),
            frames: samples.len(),
            required,
        });
    }

    for (band, chunk) in samples.chunks_exact(shape.len).take(shape.bands).enumerate() {
        builder.fill(slot, band, chunk)?;
    }
    Ok(())
}

/// Load the full bank described by `config`
///
/// Blocks while decoding; call before the audio stream starts.
pub fn load_bank(config: &LooperConfig) -> Result<BufferBank, LoaderError> {
    let shape = config.bank_shape();
    log::info!(
        "Loading bank: {} slots x {} bands x {} samples ({:.1} MB)",
        shape.slots,
        shape.bands,
        shape.len,
        shape.memory_usage() as f64 / (1024.0 * 1024.0)
    );

    let mut builder = BankBuilder::new(shape)?;

    for slot in 0..shape.slots {
        let path = config
            .bank
            .path_for_slot(slot)
            .ok_or(LoaderError::MissingSource { slot })?;

        let source = decode_mono(&path, config.bank.channel)?;
        if source.sample_rate != config.sample_rate {
            log::warn!(
                "{:?} is {} Hz, engine runs at {} Hz; loading as-is",
                path,
                source.sample_rate,
                config.sample_rate
            );
        }

        fill_slot(&mut builder, slot, &path, &source.samples)?;
        log::debug!(
            "Slot {} loaded from {:?} ({} frames, {} ch)",
            slot,
            path,
            source.samples.len(),
            source.channels
        );
    }

    let bank = builder.build()?;
    log::info!("Bank loaded: {} cells", shape.cells());
    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BankSourceConfig;
    use tempfile::TempDir;

    const LEN: usize = 16;
    const BANDS: usize = 3;

    fn write_wav(path: &Path, channels: u16, frames: &[Vec<f32>]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for s in frame {
                writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn ramp(len: usize, offset: f32) -> Vec<Vec<f32>> {
        (0..len).map(|i| vec![offset + i as f32 / 100.0]).collect()
    }

    fn config(dir: &TempDir, files: &[&str]) -> LooperConfig {
        LooperConfig {
            buffer_len: LEN,
            band_count: BANDS,
            slot_count: 2,
            max_write_frames: LEN,
            bank: BankSourceConfig {
                directory: dir.path().to_path_buf(),
                files: files.iter().map(|f| f.to_string()).collect(),
                channel: 0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_load_bank_slices_bands_in_order() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &ramp(LEN * BANDS, 0.0));
        write_wav(&dir.path().join("b.wav"), 1, &ramp(LEN * BANDS + 5, -0.5));

        let bank = load_bank(&config(&dir, &["a.wav", "b.wav"])).unwrap();
        let close = |a: f32, b: f32| (a - b).abs() < 1e-3;

        assert!(close(bank.get(0, 0, 0), 0.0));
        // band 1 starts at source frame LEN
        assert!(close(bank.get(0, 1, 0), LEN as f32 / 100.0));
        assert!(close(bank.get(0, 2, 3), (2 * LEN + 3) as f32 / 100.0));
        assert!(close(bank.get(1, 0, 1), -0.5 + 0.01));
    }

    #[test]
    fn test_short_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &ramp(LEN * BANDS, 0.0));
        write_wav(&dir.path().join("b.wav"), 1, &ramp(LEN * BANDS - 1, 0.0));

        let err = load_bank(&config(&dir, &["a.wav", "b.wav"])).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::TooShort { frames, required, .. } if frames == LEN * BANDS - 1 && required == LEN * BANDS
        ));
    }

    #[test]
    fn test_missing_file_and_source() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &ramp(LEN * BANDS, 0.0));

        let err = load_bank(&config(&dir, &["a.wav", "nope.wav"])).unwrap_err();
        assert!(matches!(err, LoaderError::Open { .. }));

        let err = load_bank(&config(&dir, &["a.wav"])).unwrap_err();
        assert!(matches!(err, LoaderError::MissingSource { slot: 1 }));
    }

    #[test]
    fn test_decode_picks_channel_modulo_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        let frames: Vec<Vec<f32>> = (0..8).map(|i| vec![0.25, -(i as f32) / 10.0]).collect();
        write_wav(&path, 2, &frames);

        let right = decode_mono(&path, 1).unwrap();
        assert_eq!(right.channels, 2);
        assert_eq!(right.samples.len(), 8);
        assert!((right.samples[5] + 0.5).abs() < 1e-3);

        let wrapped = decode_mono(&path, 2).unwrap();
        assert!(wrapped.samples.iter().all(|s| (s - 0.25).abs() < 1e-3));
    }

    #[test]
    fn test_garbage_file_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(matches!(
            decode_mono(&path, 0),
            Err(LoaderError::UnsupportedFormat { .. })
        ));
    }
}
